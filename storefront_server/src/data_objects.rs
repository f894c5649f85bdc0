use chrono::{DateTime, Utc};
use order_engine::{
    db_types::{LineItem, Order, OrderStatusChange, OrderStatusType, UserId},
    order_objects::{PurchaseItem, PurchaseRequest, SalesQuery},
    NotificationOutcome,
};
use serde::{Deserialize, Serialize};

/// The body of `POST /api/purchase`.
///
/// `requested_at` should be set by clients that may retry: retrying with the same value never charges twice. If it is
/// omitted, the time the request arrived is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequestBody {
    pub items: Vec<PurchaseItem>,
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
}

impl PurchaseRequestBody {
    pub fn into_request(self) -> PurchaseRequest {
        PurchaseRequest::new(self.items, self.requested_at.unwrap_or_else(Utc::now))
    }
}

/// Query parameters for `GET /ops/sales`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReportParams {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub user_id: Option<i64>,
    pub status: Option<OrderStatusType>,
}

impl From<SalesReportParams> for SalesQuery {
    fn from(params: SalesReportParams) -> Self {
        SalesQuery {
            from: params.from,
            to: params.to,
            user_id: params.user_id.map(UserId),
            status: params.status,
        }
    }
}

/// The response to `GET /api/orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub line_items: Vec<LineItem>,
    /// Applied status transitions, oldest first.
    pub status_history: Vec<OrderStatusChange>,
}

/// The acknowledgement returned to Stripe for every verified webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: NotificationOutcome,
}

impl WebhookAck {
    pub fn new(outcome: NotificationOutcome) -> Self {
        Self { received: true, outcome }
    }
}
