//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two belong in a separate module.
//!
//! | Route                                     | Handler                          |
//! |-------------------------------------------|----------------------------------|
//! | `GET  /health`                            | [`health`]                       |
//! | `POST /api/purchase`                      | [`purchase`]                     |
//! | `GET  /api/purchase-history`              | [`purchase_history`]             |
//! | `GET  /api/orders/{id}`                   | [`order_by_id`]                  |
//! | `POST /webhook/stripe`                    | [`stripe_webhook`]               |
//! | `GET  /ops/reconciliation`                | [`outstanding_reconciliation`]   |
//! | `POST /ops/reconciliation/replay`         | [`replay_unmatched`]             |
//! | `POST /ops/reconciliation/{id}/resolve`   | [`resolve_reconciliation_entry`] |
//! | `GET  /ops/sales`                         | [`sales_report`]                 |
//!
//! Handlers do I/O through the order engine APIs, which are async all the way down. Never block a worker thread in a
//! handler: each worker processes its requests sequentially, so a blocking handler stalls every request queued
//! behind it.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use order_engine::{
    db_types::OrderId,
    order_objects::SalesQuery,
    traits::{CatalogReader, OrderLedger, PaymentGateway, ReconciliationQueue},
    HistoryApi,
    PurchaseApi,
    ReconciliationApi,
};
use stripe_tools::webhook::SIGNATURE_HEADER;

use crate::{
    data_objects::{OrderDetail, PurchaseRequestBody, SalesReportParams, WebhookAck},
    errors::ServerError,
    identity::AuthenticatedUser,
};

/// Everything the storefront needs from its database.
pub trait StorefrontBackend: OrderLedger + CatalogReader + ReconciliationQueue {}

impl<T> StorefrontBackend for T where T: OrderLedger + CatalogReader + ReconciliationQueue {}

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Purchase  ----------------------------------------------------
route!(purchase => Post "/purchase" impl StorefrontBackend, PaymentGateway);
/// Prices the requested items, charges the user and records the order as `pending`. Responds with 201.
///
/// The order only becomes `paid` (or `failed`) once Stripe reports the outcome of the charge on the webhook.
pub async fn purchase<B, G>(
    user: AuthenticatedUser,
    api: web::Data<PurchaseApi<B, G>>,
    body: web::Json<PurchaseRequestBody>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontBackend,
    G: PaymentGateway,
{
    let request = body.into_inner().into_request();
    debug!("💻️ POST purchase for user {} with {} items", user.user_id(), request.items.len());
    let result = api.purchase(user.user_id(), request).await?;
    Ok(HttpResponse::Created().json(result))
}

route!(purchase_history => Get "/purchase-history" impl OrderLedger);
pub async fn purchase_history<B: OrderLedger>(
    user: AuthenticatedUser,
    api: web::Data<HistoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET purchase history for user {}", user.user_id());
    let history = api.purchase_history(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(order_by_id => Get "/orders/{id}" impl OrderLedger);
/// A single order belonging to the caller, with its line items and status history. Orders belonging to other users
/// are reported as not found.
pub async fn order_by_id<B: OrderLedger>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<HistoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = OrderId(path.into_inner());
    debug!("💻️ GET order {id} for user {}", user.user_id());
    let (order, line_items) = api
        .order_with_items(id)
        .await?
        .filter(|(order, _)| order.user_id == user.user_id())
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {id} does not exist")))?;
    let status_history = api.status_history(id).await?;
    Ok(HttpResponse::Ok().json(OrderDetail { order, line_items, status_history }))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(stripe_webhook => Post "/stripe" impl StorefrontBackend, PaymentGateway);
/// Receives payment intent events from Stripe.
///
/// The raw body is needed to check the signature, so it is read as bytes rather than JSON. Any verified event is
/// acknowledged with a 200, including events for charges with no matching order and events the ledger failed to
/// apply. Both are queued for an operator.
pub async fn stripe_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontBackend,
    G: PaymentGateway,
{
    trace!("💻️ Received Stripe webhook call ({} bytes)", body.len());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).ok_or_else(|| {
        warn!("💻️ SECURITY: Stripe webhook call without a valid {SIGNATURE_HEADER} header. The request is rejected.");
        ServerError::InvalidSignature(format!("Missing {SIGNATURE_HEADER} header"))
    })?;
    let outcome = api.handle_notification(&body, signature).await?;
    Ok(HttpResponse::Ok().json(WebhookAck::new(outcome)))
}

//----------------------------------------------   Operations  ----------------------------------------------------
route!(outstanding_reconciliation => Get "/reconciliation" impl StorefrontBackend, PaymentGateway);
pub async fn outstanding_reconciliation<B, G>(
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontBackend,
    G: PaymentGateway,
{
    debug!("💻️ GET outstanding reconciliation entries");
    let entries = api.outstanding_entries().await?;
    Ok(HttpResponse::Ok().json(entries))
}

route!(replay_unmatched => Post "/reconciliation/replay" impl StorefrontBackend, PaymentGateway);
pub async fn replay_unmatched<B, G>(api: web::Data<ReconciliationApi<B, G>>) -> Result<HttpResponse, ServerError>
where
    B: StorefrontBackend,
    G: PaymentGateway,
{
    info!("💻️ Operator requested a replay of unmatched notifications");
    let summary = api.replay_unmatched().await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(resolve_reconciliation_entry => Post "/reconciliation/{id}/resolve" impl StorefrontBackend, PaymentGateway);
pub async fn resolve_reconciliation_entry<B, G>(
    path: web::Path<i64>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontBackend,
    G: PaymentGateway,
{
    let id = path.into_inner();
    info!("💻️ Operator is resolving reconciliation entry #{id}");
    let entry = api.resolve_entry(id).await?;
    Ok(HttpResponse::Ok().json(entry))
}

route!(sales_report => Get "/sales" impl OrderLedger);
pub async fn sales_report<B: OrderLedger>(
    params: web::Query<SalesReportParams>,
    api: web::Data<HistoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = SalesQuery::from(params.into_inner());
    debug!("💻️ GET sales report from {} to {}", query.from, query.to);
    if query.from > query.to {
        return Err(ServerError::ValidationError(format!("`from` ({}) is after `to` ({})", query.from, query.to)));
    }
    let report = api.sales_report(query).await?;
    Ok(HttpResponse::Ok().json(report))
}

