use serde::{Deserialize, Serialize};

use crate::db_types::{
    NewReconciliationEntry,
    Order,
    OrderStatusType,
    PaymentReference,
    ReconciliationEntry,
    ReconciliationReason,
};

/// An order left `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }
}

/// Something happened that the engine could not resolve by itself.
///
/// `entry` is the queued reconciliation record. It is `None` when the record itself could not be written, in which
/// case this event (and the log) is the only trace of the problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequiredEvent {
    pub reason: ReconciliationReason,
    pub payment_reference: PaymentReference,
    pub detail: String,
    pub entry: Option<ReconciliationEntry>,
}

impl ReconciliationRequiredEvent {
    pub fn new(request: &NewReconciliationEntry, entry: Option<ReconciliationEntry>) -> Self {
        Self {
            reason: request.reason,
            payment_reference: request.payment_reference.clone(),
            detail: request.detail.clone(),
            entry,
        }
    }
}
