use thiserror::Error;

use crate::{
    db_types::{PaymentReference, ProductId},
    traits::{CatalogError, GatewayError, LedgerError, NotificationError, ReconciliationQueueError},
};

#[derive(Debug, Clone, Error)]
pub enum PurchaseError {
    #[error("Invalid purchase request. {0}")]
    ValidationError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("The catalog is unavailable. {0}")]
    CatalogUnavailable(String),
    #[error("The charge was declined. {0}")]
    GatewayRejected(String),
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
    /// A charge exists for this purchase, but the order could not be recorded. It has been queued for an operator.
    #[error("Charge {payment_reference} was created, but the order could not be saved. {reason}")]
    LedgerWriteFailure { payment_reference: PaymentReference, reason: String },
}

impl From<CatalogError> for PurchaseError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => PurchaseError::ProductNotFound(id),
            e => PurchaseError::CatalogUnavailable(e.to_string()),
        }
    }
}

impl From<GatewayError> for PurchaseError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Rejected(s) => PurchaseError::GatewayRejected(s),
            GatewayError::Unavailable(s) => PurchaseError::GatewayUnavailable(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Notification signature is invalid. {0}")]
    SignatureInvalid(String),
    #[error("Notification payload is malformed. {0}")]
    Malformed(String),
    /// The ledger could not be reached by an operator action.
    #[error("The ledger is unavailable. {0}")]
    LedgerUnavailable(String),
    #[error("Reconciliation queue error. {0}")]
    QueueError(#[from] ReconciliationQueueError),
}

impl From<NotificationError> for ReconciliationError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::SignatureInvalid(s) => ReconciliationError::SignatureInvalid(s),
            NotificationError::Malformed(s) => ReconciliationError::Malformed(s),
        }
    }
}

impl From<LedgerError> for ReconciliationError {
    fn from(e: LedgerError) -> Self {
        ReconciliationError::LedgerUnavailable(e.to_string())
    }
}
