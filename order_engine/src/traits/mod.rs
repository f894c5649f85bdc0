//! # Backend contracts for the order engine
//!
//! The APIs in this crate never talk to a database or a card processor directly. Instead they are generic over
//! backends that implement the traits in this module.
//!
//! * [`CatalogReader`] resolves a product id to a current price snapshot.
//! * [`OrderLedger`] is the transactional store of orders and line items, and the sole owner of order status.
//! * [`ReconciliationQueue`] records the conditions that need an operator's attention.
//! * [`PaymentGateway`] creates charges and verifies the asynchronous notifications that report their outcome.
//!
//! [`crate::SqliteDatabase`] implements the first three. The Stripe implementation of [`PaymentGateway`] lives in the
//! server, so that this crate stays free of HTTP clients.
mod catalog_reader;
mod order_ledger;
mod payment_gateway;
mod reconciliation_queue;

pub use catalog_reader::{CatalogError, CatalogReader};
pub use order_ledger::{LedgerError, OrderLedger, StatusUpdate};
pub use payment_gateway::{
    ChargeId,
    GatewayError,
    GatewayNotification,
    IdempotencyKey,
    NotificationError,
    NotificationKind,
    PaymentGateway,
};
pub use reconciliation_queue::{ReconciliationQueue, ReconciliationQueueError};
