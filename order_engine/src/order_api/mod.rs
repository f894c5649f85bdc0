//! # Order engine public API
//!
//! The API is split by concern, and each part is generic over the backend traits it needs:
//!
//! * [`purchase_api`] turns a purchase request into a charged, `pending` order.
//! * [`reconciliation_api`] consumes payment gateway notifications, moves orders out of `pending`, and gives
//!   operators the tools to work through the reconciliation queue.
//! * [`history_api`] serves purchase histories and sales reports.
//!
//! ```rust,ignore
//! let db = SqliteDatabase::new_with_url(url, 25).await?;
//! let api = PurchaseApi::new(db, gateway, EventProducers::default(), Deadlines::default());
//! let result = api.purchase(user_id, request).await?;
//! ```
use std::{future::Future, time::Duration};

pub mod errors;
pub mod history_api;
pub mod order_objects;
pub mod purchase_api;
pub mod reconciliation_api;

pub const DEFAULT_GATEWAY_DEADLINE: Duration = Duration::from_secs(5);
pub const DEFAULT_LEDGER_DEADLINE: Duration = Duration::from_secs(3);

/// Upper bounds on how long the engine waits for its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub gateway: Duration,
    /// Applies to the ledger, the catalog and the reconciliation queue.
    pub ledger: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self { gateway: DEFAULT_GATEWAY_DEADLINE, ledger: DEFAULT_LEDGER_DEADLINE }
    }
}

/// Awaits `fut`, giving up after `deadline`. On timeout, the future is dropped (which rolls back any open
/// transaction) and `on_timeout` supplies the error.
pub(crate) async fn bounded<T, E, F>(deadline: Duration, fut: F, on_timeout: fn(u128) -> E) -> Result<T, E>
where F: Future<Output = Result<T, E>> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(deadline.as_millis())),
    }
}
