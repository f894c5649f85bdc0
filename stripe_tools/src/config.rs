use std::time::Duration;

use log::*;
use storefront_common::{helpers::parse_number, Secret, CURRENCY_CODE_LOWER};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
/// Stripe's own libraries reject signatures older than five minutes.
pub const DEFAULT_SIGNATURE_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_base: String,
    pub secret_key: Secret<String>,
    /// The signing secret for the webhook endpoint (`whsec_...`).
    pub webhook_secret: Secret<String>,
    pub currency: String,
    pub request_timeout: Duration,
    pub signature_tolerance: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            currency: CURRENCY_CODE_LOWER.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            signature_tolerance: DEFAULT_SIGNATURE_TOLERANCE,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_base = std::env::var("SFG_STRIPE_API_BASE").unwrap_or_else(|_| {
            info!("🪛️ SFG_STRIPE_API_BASE not set, using {DEFAULT_API_BASE}");
            DEFAULT_API_BASE.to_string()
        });
        let secret_key = Secret::new(std::env::var("SFG_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SFG_STRIPE_SECRET_KEY not set. Charge creation will be rejected by Stripe.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("SFG_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SFG_STRIPE_WEBHOOK_SECRET not set. Every webhook call will fail signature verification.");
            String::default()
        }));
        let request_timeout = parse_number(std::env::var("SFG_GATEWAY_TIMEOUT_MS").ok(), DEFAULT_REQUEST_TIMEOUT_MS)
            .unwrap_or_else(|v| {
                warn!("🪛️ Invalid value for SFG_GATEWAY_TIMEOUT_MS: {v}. Using {DEFAULT_REQUEST_TIMEOUT_MS}ms.");
                DEFAULT_REQUEST_TIMEOUT_MS
            });
        let tolerance_secs = parse_number(
            std::env::var("SFG_STRIPE_SIGNATURE_TOLERANCE_SECS").ok(),
            DEFAULT_SIGNATURE_TOLERANCE.as_secs(),
        )
        .unwrap_or_else(|v| {
            warn!("🪛️ Invalid value for SFG_STRIPE_SIGNATURE_TOLERANCE_SECS: {v}. Using the default.");
            DEFAULT_SIGNATURE_TOLERANCE.as_secs()
        });
        Self {
            api_base,
            secret_key,
            webhook_secret,
            currency: CURRENCY_CODE_LOWER.to_string(),
            request_timeout: Duration::from_millis(request_timeout),
            signature_tolerance: Duration::from_secs(tolerance_secs),
        }
    }
}
