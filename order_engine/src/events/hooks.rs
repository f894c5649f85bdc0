use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, OrderStatusChangedEvent, ReconciliationRequiredEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub reconciliation_required_producer: Vec<EventProducer<ReconciliationRequiredEvent>>,
}

pub struct EventHandlers {
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_reconciliation_required: Option<EventHandler<ReconciliationRequiredEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_reconciliation_required = hooks.on_reconciliation_required.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_status_changed, on_reconciliation_required }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_reconciliation_required {
            result.reconciliation_required_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_reconciliation_required {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_reconciliation_required: Option<Handler<ReconciliationRequiredEvent>>,
}

impl EventHooks {
    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_reconciliation_required<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReconciliationRequiredEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_reconciliation_required = Some(Arc::new(f));
        self
    }
}

impl EventProducers {
    pub async fn publish_order_status_changed(&self, event: OrderStatusChangedEvent) {
        for emitter in &self.order_status_changed_producer {
            debug!("📬️ Notifying order status changed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_reconciliation_required(&self, event: ReconciliationRequiredEvent) {
        for emitter in &self.reconciliation_required_producer {
            debug!("📬️ Notifying reconciliation required hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
