//! Glue between the Stripe client and the order engine's [`PaymentGateway`] trait.
use log::*;
use order_engine::traits::{
    ChargeId,
    GatewayError,
    GatewayNotification,
    IdempotencyKey,
    NotificationError,
    NotificationKind,
    PaymentGateway,
};
use storefront_common::Amount;
use stripe_tools::{
    data_objects::{PAYMENT_INTENT_FAILED, PAYMENT_INTENT_SUCCEEDED},
    webhook,
    StripeApi,
    StripeApiError,
    StripeConfig,
    StripeEvent,
    WebhookError,
};

#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let api = StripeApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for StripeGateway {
    async fn create_charge(&self, amount: Amount, key: &IdempotencyKey) -> Result<ChargeId, GatewayError> {
        let minor_units = amount.to_minor_units().map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let intent = self.api.create_payment_intent(minor_units, key.as_str()).await.map_err(|e| {
            warn!("💳️ Stripe charge for {amount} failed. {e}");
            gateway_error(e)
        })?;
        info!("💳️ Stripe created payment intent {} for {minor_units} minor units", intent.id);
        Ok(ChargeId::from(intent.id))
    }

    fn verify_and_decode_notification(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<GatewayNotification, NotificationError> {
        let config = self.api.config();
        let event = webhook::construct_event(
            payload,
            signature_header,
            config.webhook_secret.reveal(),
            config.signature_tolerance,
        )
        .map_err(|e| match e {
            WebhookError::SignatureInvalid(s) => NotificationError::SignatureInvalid(s),
            WebhookError::Malformed(s) => NotificationError::Malformed(s),
        })?;
        notification_from_event(&event)
    }
}

fn gateway_error(e: StripeApiError) -> GatewayError {
    match e {
        StripeApiError::Rejected { .. } | StripeApiError::InvalidAmount(_) => GatewayError::Rejected(e.to_string()),
        e => GatewayError::Unavailable(e.to_string()),
    }
}

/// Maps a verified Stripe event onto a gateway notification. The charge id is the payment intent id.
pub fn notification_from_event(event: &StripeEvent) -> Result<GatewayNotification, NotificationError> {
    let kind = match event.event_type.as_str() {
        PAYMENT_INTENT_SUCCEEDED => NotificationKind::Succeeded,
        PAYMENT_INTENT_FAILED => NotificationKind::Failed,
        other => NotificationKind::Other(other.to_string()),
    };
    let charge_id = event
        .object_id()
        .ok_or_else(|| NotificationError::Malformed(format!("Event {} has no data.object.id", event.id)))?;
    trace!("💳️ Stripe event {} ({}) refers to {charge_id}", event.id, event.event_type);
    Ok(GatewayNotification::new(kind, ChargeId::from(charge_id)))
}
