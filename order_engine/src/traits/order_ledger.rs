use thiserror::Error;

use crate::{
    db_types::{
        LineItem,
        NewLineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatusChange,
        OrderStatusType,
        PaymentReference,
        UserId,
    },
    order_objects::{OrderHistoryEntry, ProductSales, SalesQuery},
};

/// The outcome of a successful status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The order moved from `old` to the status now held in `order`.
    Updated { old: OrderStatusType, order: Order },
    /// The order already had the requested status. Nothing was written.
    Unchanged(Order),
}

impl StatusUpdate {
    pub fn order(&self) -> &Order {
        match self {
            StatusUpdate::Updated { order, .. } => order,
            StatusUpdate::Unchanged(order) => order,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, StatusUpdate::Updated { .. })
    }
}

/// The transactional store of orders and their line items.
///
/// The ledger owns the order lifecycle: an order is created exactly once, as `pending`, together with all of its line
/// items, and later leaves `pending` exactly once.
#[allow(async_fn_in_trait)]
pub trait OrderLedger: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts the order and all its line items in a single atomic transaction. The order is always created with
    /// status `pending`.
    ///
    /// If any line item cannot be written, the whole transaction is rolled back, and neither the order nor any of
    /// its line items are persisted.
    async fn create_order(
        &self,
        order: NewOrder,
        line_items: Vec<NewLineItem>,
    ) -> Result<(Order, Vec<LineItem>), LedgerError>;

    /// Moves the order with the given payment reference out of `pending`.
    ///
    /// * `pending` to `paid` or `failed` updates the order, records an audit row and returns
    ///   [`StatusUpdate::Updated`].
    /// * Asking for the status the order already has returns [`StatusUpdate::Unchanged`] and writes nothing.
    /// * Asking a terminal order for the other terminal status fails with [`LedgerError::IllegalTransition`].
    /// * If no order carries the reference, [`LedgerError::NotFound`] is returned. Callers should treat this as an
    ///   expected condition, since notifications can arrive before the order is committed.
    async fn update_status_by_payment_reference(
        &self,
        reference: &PaymentReference,
        new_status: OrderStatusType,
    ) -> Result<StatusUpdate, LedgerError>;

    /// All orders belonging to `user_id`, each with its own line items and a snapshot of the product's descriptive
    /// fields. The most recent order comes first; line items keep the order in which they were inserted.
    async fn purchase_history(&self, user_id: UserId) -> Result<Vec<OrderHistoryEntry>, LedgerError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, LedgerError>;

    async fn fetch_order_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, LedgerError>;

    async fn fetch_line_items(&self, order_id: OrderId) -> Result<Vec<LineItem>, LedgerError>;

    /// The audit trail of applied status transitions for the order, oldest first.
    async fn status_history(&self, order_id: OrderId) -> Result<Vec<OrderStatusChange>, LedgerError>;

    /// Units sold and revenue per product for orders created inside the query window, highest revenue first.
    async fn sales_report(&self, query: SalesQuery) -> Result<Vec<ProductSales>, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Ledger database error: {0}")]
    DatabaseError(String),
    #[error("No order has payment reference {0}")]
    NotFound(PaymentReference),
    #[error("Order {id} is already {current} and cannot become {requested}")]
    IllegalTransition { id: OrderId, current: OrderStatusType, requested: OrderStatusType },
    #[error("Orders can only be moved to a terminal status, not {0}")]
    InvalidTargetStatus(OrderStatusType),
    #[error("An order with payment reference {0} already exists")]
    DuplicatePaymentReference(PaymentReference),
    #[error("The ledger did not respond within {0}ms")]
    Timeout(u128),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
