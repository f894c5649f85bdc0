use std::time::Duration;

use log::*;
use order_engine::{traits::ReconciliationQueue, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the reconciliation monitor, which periodically reports how many reconciliation entries are waiting for an
/// operator. It never resolves or replays anything itself. Do not await the returned JoinHandle, as it will run
/// indefinitely.
pub fn start_reconciliation_monitor(db: SqliteDatabase, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Reconciliation monitor started. Checking every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Checking the reconciliation queue");
            match db.count_outstanding().await {
                Ok(0) => debug!("🕰️ The reconciliation queue is empty"),
                Ok(n) => warn!("🕰️ {n} reconciliation entries are waiting for an operator. See GET /ops/reconciliation"),
                Err(e) => error!("🕰️ Could not read the reconciliation queue. {e}"),
            }
        }
    })
}
