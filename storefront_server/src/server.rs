use std::time::Duration;

use actix_web::{dev::Server, error::JsonPayloadError, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_engine::{
    events::EventProducers,
    traits::PaymentGateway,
    HistoryApi,
    PurchaseApi,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    hooks::{create_event_handlers, EVENT_BUFFER_SIZE},
    integrations::stripe::StripeGateway,
    reconciliation_monitor::start_reconciliation_monitor,
    routes::{
        health,
        OrderByIdRoute,
        OutstandingReconciliationRoute,
        PurchaseHistoryRoute,
        PurchaseRoute,
        ReplayUnmatchedRoute,
        ResolveReconciliationEntryRoute,
        SalesReportRoute,
        StorefrontBackend,
        StripeWebhookRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_timeout(&config.database_url, config.db_max_connections, config.deadlines.ledger)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        StripeGateway::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_event_handlers(EVENT_BUFFER_SIZE);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    // The monitor runs for the lifetime of the process
    let _monitor = start_reconciliation_monitor(db.clone(), config.reconciliation_monitor_interval);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: StripeGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let deadlines = config.deadlines;
    let srv = HttpServer::new(move || {
        let purchase_api = PurchaseApi::new(db.clone(), gateway.clone(), producers.clone(), deadlines);
        let reconciliation_api = ReconciliationApi::new(db.clone(), gateway.clone(), producers.clone(), deadlines);
        let history_api = HistoryApi::new(db.clone(), deadlines);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sfg::access_log"))
            .app_data(web::Data::new(purchase_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(history_api))
            .configure(storefront_routes::<SqliteDatabase, StripeGateway>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The engine APIs for backend `B` and gateway `G` must already be in the app data.
pub fn storefront_routes<B, G>(cfg: &mut web::ServiceConfig)
where
    B: StorefrontBackend + 'static,
    G: PaymentGateway + 'static,
{
    let api_scope = web::scope("/api")
        .app_data(json_config())
        .service(PurchaseRoute::<B, G>::new())
        .service(PurchaseHistoryRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new());
    let webhook_scope = web::scope("/webhook").service(StripeWebhookRoute::<B, G>::new());
    let ops_scope = web::scope("/ops")
        .service(OutstandingReconciliationRoute::<B, G>::new())
        .service(ReplayUnmatchedRoute::<B, G>::new())
        .service(ResolveReconciliationEntryRoute::<B, G>::new())
        .service(SalesReportRoute::<B>::new());
    cfg.service(health).service(api_scope).service(webhook_scope).service(ops_scope);
}

/// Bad JSON bodies get the same `{"error": ...}` response as every other error.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            e => e.to_string(),
        };
        debug!("💻️ Rejected request body. {message}");
        ServerError::InvalidRequestBody(message).into()
    })
}
