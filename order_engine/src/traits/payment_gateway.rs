use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use storefront_common::Amount;
use thiserror::Error;

use crate::db_types::{OrderStatusType, PaymentReference, UserId};

/// The gateway-assigned charge id. It is stored on the order as its payment reference.
pub type ChargeId = PaymentReference;

//--------------------------------------    IdempotencyKey     ---------------------------------------------------------
/// Repeated charge requests carrying the same key produce at most one charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// Derives the key for a purchase from the requesting user and the time the request was made. A client that
    /// retries the same purchase with the same timestamp gets the same key, and therefore the same charge.
    pub fn for_purchase(user_id: UserId, requested_at: DateTime<Utc>) -> Self {
        let ts = requested_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        Self(format!("orderTime__{ts}__userID__{user_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------  GatewayNotification  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Succeeded,
    Failed,
    /// Any other event type. These are acknowledged but never acted upon.
    Other(String),
}

impl NotificationKind {
    /// The order status this notification asks for, if any.
    pub fn target_status(&self) -> Option<OrderStatusType> {
        match self {
            NotificationKind::Succeeded => Some(OrderStatusType::Paid),
            NotificationKind::Failed => Some(OrderStatusType::Failed),
            NotificationKind::Other(_) => None,
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Succeeded => write!(f, "succeeded"),
            NotificationKind::Failed => write!(f, "failed"),
            NotificationKind::Other(t) => write!(f, "other({t})"),
        }
    }
}

/// A verified, decoded asynchronous status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayNotification {
    pub kind: NotificationKind,
    pub charge_id: ChargeId,
}

impl GatewayNotification {
    pub fn new(kind: NotificationKind, charge_id: ChargeId) -> Self {
        Self { kind, charge_id }
    }
}

//--------------------------------------    PaymentGateway     ---------------------------------------------------------
/// A card processor client.
///
/// Implementations hold their own credentials and webhook signing secret as explicit configuration.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Requests a charge for `amount`. The amount is converted to minor units by the implementation, using
    /// [`Amount::to_minor_units`].
    async fn create_charge(&self, amount: Amount, key: &IdempotencyKey) -> Result<ChargeId, GatewayError>;

    /// Checks the signature on a raw notification payload and decodes it. Payloads that fail verification must never
    /// be acted upon.
    fn verify_and_decode_notification(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<GatewayNotification, NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The processor looked at the request and declined it.
    #[error("The payment gateway rejected the charge. {0}")]
    Rejected(String),
    /// The outcome of the request is unknown: timeouts, network failures, rate limiting and server errors.
    #[error("The payment gateway is unavailable. {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Notification signature is invalid. {0}")]
    SignatureInvalid(String),
    #[error("Notification payload is malformed. {0}")]
    Malformed(String),
}
