//! Storefront Order Engine
//!
//! The order engine is the transaction core of the storefront. It turns purchase requests into charged orders, and
//! keeps order status in step with the payment gateway's asynchronous notifications.
//!
//! The library is divided into these sections:
//! 1. Backend contracts ([`mod@traits`]). The engine never talks to a database or card processor directly. SQLite is
//!    the supported ledger backend ([`SqliteDatabase`]); the payment gateway is supplied by the caller.
//! 2. The public API. [`PurchaseApi`] assembles and records purchases, [`ReconciliationApi`] applies gateway
//!    notifications and serves the operator's reconciliation tools, and [`HistoryApi`] serves purchase histories and
//!    sales reports.
//! 3. Data types ([`mod@db_types`] and [`order_objects`]).
//!
//! The engine also emits events when an order leaves `pending`, and whenever something needs an operator's attention.
//! See [`mod@events`] for how to subscribe to them.
pub mod db_types;
pub mod events;
mod order_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use order_api::{
    errors::{PurchaseError, ReconciliationError},
    history_api::HistoryApi,
    order_objects,
    purchase_api::{validate_request, PurchaseApi},
    reconciliation_api::{NotificationOutcome, ReconciliationApi},
    Deadlines,
    DEFAULT_GATEWAY_DEADLINE,
    DEFAULT_LEDGER_DEADLINE,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
