use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{
        NewReconciliationEntry,
        Order,
        OrderStatusType,
        PaymentReference,
        ReconciliationEntry,
        ReconciliationReason,
    },
    events::{EventProducers, OrderStatusChangedEvent, ReconciliationRequiredEvent},
    order_api::{bounded, errors::ReconciliationError, Deadlines},
    order_objects::ReplaySummary,
    traits::{
        GatewayNotification,
        LedgerError,
        OrderLedger,
        PaymentGateway,
        ReconciliationQueue,
        ReconciliationQueueError,
        StatusUpdate,
    },
};

/// What the listener did with a verified notification. Every variant is a success from the gateway's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationOutcome {
    /// The order left `pending`.
    Applied(Order),
    /// The order already had the requested status.
    AlreadyApplied(Order),
    /// No order carries the charge id. The notification was queued for an operator.
    Unmatched(PaymentReference),
    /// The order is already in the other terminal status. The notification was queued for an operator.
    Conflict(PaymentReference),
    /// The ledger could not apply the notification. It was queued for an operator to replay.
    Deferred(PaymentReference),
    /// The event type is not one that changes order status.
    Ignored(String),
}

/// `ReconciliationApi` consumes asynchronous payment gateway notifications and applies them to the ledger.
///
/// Notifications can arrive before the purchase that created the charge has committed its order, more than once,
/// and in any order. The listener handles this as follows:
/// * An unverifiable payload is rejected and never applied.
/// * A charge id with no matching order is a soft success: it is logged, queued as an unmatched notification, and
///   never retried automatically. An operator can replay it once the order exists.
/// * A repeated notification is a no-op.
/// * The first terminal status wins. A notification asking for the other terminal status is queued as a conflict.
/// * A ledger failure while applying a verified notification is logged and queued for replay. The gateway still gets
///   an acknowledgement.
pub struct ReconciliationApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    deadlines: Deadlines,
}

impl<B, G> Debug for ReconciliationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi ({:?})", self.deadlines)
    }
}

impl<B, G> ReconciliationApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, deadlines: Deadlines) -> Self {
        Self { db, gateway, producers, deadlines }
    }
}

impl<B, G> ReconciliationApi<B, G>
where
    B: OrderLedger + ReconciliationQueue,
    G: PaymentGateway,
{
    /// Verifies and decodes a raw notification, then applies it.
    ///
    /// Only [`ReconciliationError::SignatureInvalid`] and [`ReconciliationError::Malformed`] are returned, and both
    /// mean that the payload itself was bad. Once verified, the notification is always acknowledged.
    pub async fn handle_notification(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<NotificationOutcome, ReconciliationError> {
        let notification = self.gateway.verify_and_decode_notification(payload, signature_header).map_err(|e| {
            warn!("🔁️ SECURITY: Rejected a payment notification that failed verification. {e}");
            ReconciliationError::from(e)
        })?;
        self.apply_notification(notification).await
    }

    /// Applies an already verified notification to the ledger.
    pub async fn apply_notification(
        &self,
        notification: GatewayNotification,
    ) -> Result<NotificationOutcome, ReconciliationError> {
        let GatewayNotification { kind, charge_id } = notification;
        let status = match kind.target_status() {
            Some(status) => status,
            None => {
                info!("🔁️ Ignoring {kind} notification for {charge_id}");
                return Ok(NotificationOutcome::Ignored(kind.to_string()));
            },
        };
        debug!("🔁️ Received {kind} notification for {charge_id}");
        match self.update_status(&charge_id, status).await {
            Ok(StatusUpdate::Updated { old, order }) => {
                info!("🔁️ Order {} is now {status} (charge {charge_id})", order.id);
                self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(old, order.clone())).await;
                Ok(NotificationOutcome::Applied(order))
            },
            Ok(StatusUpdate::Unchanged(order)) => {
                debug!("🔁️ Order {} was already {status}. Duplicate notification ignored", order.id);
                Ok(NotificationOutcome::AlreadyApplied(order))
            },
            Err(LedgerError::NotFound(reference)) => {
                warn!(
                    "🔁️ No order matches charge {reference} for a {status} notification. Queuing it for an operator."
                );
                self.queue(NewReconciliationEntry::unmatched(reference.clone(), status)).await;
                Ok(NotificationOutcome::Unmatched(reference))
            },
            Err(LedgerError::IllegalTransition { id, current, requested }) => {
                warn!("🔁️ Order {id} is already {current}, but charge {charge_id} reported {requested}. Queuing it.");
                self.queue_conflict(&charge_id, current, requested).await;
                Ok(NotificationOutcome::Conflict(charge_id))
            },
            Err(e) => {
                error!("🔁️ RECONCILIATION REQUIRED. Could not apply {status} notification for charge {charge_id}. {e}");
                self.queue(NewReconciliationEntry::unapplied(charge_id.clone(), status, &e.to_string())).await;
                Ok(NotificationOutcome::Deferred(charge_id))
            },
        }
    }

    /// Unresolved reconciliation entries, oldest first.
    pub async fn outstanding_entries(&self) -> Result<Vec<ReconciliationEntry>, ReconciliationError> {
        let entries =
            bounded(self.deadlines.ledger, self.db.outstanding_entries(None), ReconciliationQueueError::Timeout).await?;
        Ok(entries)
    }

    pub async fn count_outstanding(&self) -> Result<i64, ReconciliationError> {
        let count = bounded(self.deadlines.ledger, self.db.count_outstanding(), ReconciliationQueueError::Timeout).await?;
        Ok(count)
    }

    /// Marks an entry as handled by an operator.
    pub async fn resolve_entry(&self, id: i64) -> Result<ReconciliationEntry, ReconciliationError> {
        let entry = bounded(self.deadlines.ledger, self.db.resolve_entry(id), ReconciliationQueueError::Timeout).await?;
        info!("🔁️ Reconciliation entry #{id} ({}) for {} resolved", entry.reason, entry.payment_reference);
        Ok(entry)
    }

    /// Re-applies every unresolved unmatched notification whose order now exists.
    ///
    /// This is only ever triggered by an operator. Entries whose order still does not exist are left outstanding.
    pub async fn replay_unmatched(&self) -> Result<ReplaySummary, ReconciliationError> {
        let pending = bounded(
            self.deadlines.ledger,
            self.db.outstanding_entries(Some(ReconciliationReason::UnmatchedNotification)),
            ReconciliationQueueError::Timeout,
        )
        .await?;
        info!("🔁️ Replaying {} unmatched notifications", pending.len());
        let mut summary = ReplaySummary::default();
        for entry in pending {
            let status = match entry.requested_status {
                Some(s) if s.is_terminal() => s,
                _ => {
                    warn!("🔁️ Entry #{} has no status to replay. Leaving it for manual handling", entry.id);
                    summary.still_unmatched.push(entry.id);
                    continue;
                },
            };
            match self.update_status(&entry.payment_reference, status).await {
                Ok(update) => {
                    if let StatusUpdate::Updated { old, order } = update {
                        info!("🔁️ Replayed entry #{}: order {} is now {status}", entry.id, order.id);
                        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(old, order)).await;
                    }
                    self.resolve_entry(entry.id).await?;
                    summary.applied.push(entry.id);
                },
                Err(LedgerError::NotFound(_)) => {
                    debug!("🔁️ Entry #{}: charge {} still has no order", entry.id, entry.payment_reference);
                    summary.still_unmatched.push(entry.id);
                },
                Err(LedgerError::IllegalTransition { current, requested, .. }) => {
                    self.queue_conflict(&entry.payment_reference, current, requested).await;
                    self.resolve_entry(entry.id).await?;
                    summary.conflicts.push(entry.id);
                },
                Err(e) => return Err(ReconciliationError::from(e)),
            }
        }
        Ok(summary)
    }

    async fn update_status(
        &self,
        reference: &PaymentReference,
        status: OrderStatusType,
    ) -> Result<StatusUpdate, LedgerError> {
        let update = self.db.update_status_by_payment_reference(reference, status);
        bounded(self.deadlines.ledger, update, LedgerError::Timeout).await
    }

    async fn queue_conflict(&self, reference: &PaymentReference, current: OrderStatusType, requested: OrderStatusType) {
        let fetch = self.db.fetch_order_by_payment_reference(reference);
        let order = bounded(self.deadlines.ledger, fetch, LedgerError::Timeout).await.ok().flatten();
        let request = NewReconciliationEntry::conflicting(reference.clone(), current, requested, order.as_ref());
        self.queue(request).await;
    }

    /// Records the entry and publishes a `ReconciliationRequired` event. Failing to record the entry is logged but
    /// does not fail the notification, since the payload itself was valid.
    async fn queue(&self, request: NewReconciliationEntry) {
        let push = self.db.push_entry(request.clone());
        let entry = match bounded(self.deadlines.ledger, push, ReconciliationQueueError::Timeout).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!(
                    "🔁️ RECONCILIATION REQUIRED. Could not queue {} for {}. {e}",
                    request.reason, request.payment_reference
                );
                None
            },
        };
        self.producers.publish_reconciliation_required(ReconciliationRequiredEvent::new(&request, entry)).await;
    }
}
