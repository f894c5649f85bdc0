//! Event hooks installed by the server. For now they only write to the log, which is where operators watch for
//! reconciliation problems between runs of the reconciliation monitor.
use log::*;
use order_engine::events::{EventHandlers, EventHooks, OrderStatusChangedEvent, ReconciliationRequiredEvent};

pub const EVENT_BUFFER_SIZE: usize = 128;

pub fn create_event_handlers(buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_status_changed(|ev| Box::pin(log_status_change(ev)));
    hooks.on_reconciliation_required(|ev| Box::pin(log_reconciliation_required(ev)));
    EventHandlers::new(buffer_size, hooks)
}

async fn log_status_change(ev: OrderStatusChangedEvent) {
    let order = &ev.order;
    info!(
        "📬️ Order {} for user {} moved from {} to {} (charge {}, {})",
        order.id, order.user_id, ev.old_status, order.status, order.payment_reference, order.total_amount
    );
}

async fn log_reconciliation_required(ev: ReconciliationRequiredEvent) {
    match &ev.entry {
        Some(entry) => error!(
            "📬️ RECONCILIATION REQUIRED. Entry #{} ({}) for charge {}: {}",
            entry.id, ev.reason, ev.payment_reference, ev.detail
        ),
        None => error!(
            "📬️ RECONCILIATION REQUIRED and NOT QUEUED. {} for charge {}: {}",
            ev.reason, ev.payment_reference, ev.detail
        ),
    }
}
