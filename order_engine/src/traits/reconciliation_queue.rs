use thiserror::Error;

use crate::db_types::{NewReconciliationEntry, ReconciliationEntry, ReconciliationReason};

/// Storage for conditions that need a human to look at them.
#[allow(async_fn_in_trait)]
pub trait ReconciliationQueue: Clone {
    async fn push_entry(&self, entry: NewReconciliationEntry) -> Result<ReconciliationEntry, ReconciliationQueueError>;

    /// Unresolved entries, oldest first. If `reason` is given, only entries with that reason are returned.
    async fn outstanding_entries(
        &self,
        reason: Option<ReconciliationReason>,
    ) -> Result<Vec<ReconciliationEntry>, ReconciliationQueueError>;

    /// Marks the entry as resolved, and returns it. Resolving an entry that is already resolved leaves the original
    /// resolution time in place.
    async fn resolve_entry(&self, id: i64) -> Result<ReconciliationEntry, ReconciliationQueueError>;

    async fn count_outstanding(&self) -> Result<i64, ReconciliationQueueError> {
        let entries = self.outstanding_entries(None).await?;
        Ok(entries.len() as i64)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationQueueError {
    #[error("Reconciliation queue database error: {0}")]
    DatabaseError(String),
    #[error("Reconciliation entry {0} does not exist")]
    EntryNotFound(i64),
    #[error("The reconciliation queue did not respond within {0}ms")]
    Timeout(u128),
}

impl From<sqlx::Error> for ReconciliationQueueError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationQueueError::DatabaseError(e.to_string())
    }
}
