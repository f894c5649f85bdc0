use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::*;
use storefront_common::{Amount, MinorUnits};

use crate::traits::{
    ChargeId,
    GatewayError,
    GatewayNotification,
    IdempotencyKey,
    NotificationError,
    NotificationKind,
    PaymentGateway,
};

/// The signature header value that [`FakeGateway`] accepts.
pub const FAKE_WEBHOOK_SECRET: &str = "fake-gateway-signature";

#[derive(Debug, Default)]
struct FakeGatewayState {
    charges: HashMap<String, (ChargeId, MinorUnits)>,
    next_failure: Option<GatewayError>,
    delay: Option<Duration>,
}

/// An in-memory card processor.
///
/// Charges are keyed by idempotency key, so repeating a request returns the original charge id. Notifications are
/// JSON-encoded [`GatewayNotification`]s, and the "signature" is just [`FAKE_WEBHOOK_SECRET`].
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeGatewayState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next charge request fails with `err`. Later requests succeed again.
    pub fn fail_next_charge(&self, err: GatewayError) {
        self.state.lock().expect("poisoned lock").next_failure = Some(err);
    }

    /// Every charge request sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().expect("poisoned lock").delay = Some(delay);
    }

    pub fn charge_count(&self) -> usize {
        self.state.lock().expect("poisoned lock").charges.len()
    }

    /// The amount charged for the given charge id, in minor units.
    pub fn charged_amount(&self, charge_id: &ChargeId) -> Option<MinorUnits> {
        let state = self.state.lock().expect("poisoned lock");
        state.charges.values().find(|(id, _)| id == charge_id).map(|(_, amount)| *amount)
    }

    pub fn notification_payload(kind: NotificationKind, charge_id: &ChargeId) -> Vec<u8> {
        let notification = GatewayNotification::new(kind, charge_id.clone());
        serde_json::to_vec(&notification).expect("notification is always serializable")
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_charge(&self, amount: Amount, key: &IdempotencyKey) -> Result<ChargeId, GatewayError> {
        let delay = self.state.lock().expect("poisoned lock").delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().expect("poisoned lock");
        if let Some(err) = state.next_failure.take() {
            return Err(err);
        }
        let minor_units = amount.to_minor_units().map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let next_id = state.charges.len() + 1;
        let (charge_id, _) = state
            .charges
            .entry(key.as_str().to_string())
            .or_insert_with(|| (ChargeId::from(format!("ch_fake_{next_id:04}")), minor_units));
        trace!("💳️ Fake charge {charge_id} for {minor_units} [{key}]");
        Ok(charge_id.clone())
    }

    fn verify_and_decode_notification(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<GatewayNotification, NotificationError> {
        if signature_header != FAKE_WEBHOOK_SECRET {
            return Err(NotificationError::SignatureInvalid("Signature does not match".into()));
        }
        serde_json::from_slice(payload).map_err(|e| NotificationError::Malformed(e.to_string()))
    }
}
