use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    StatusCode,
};
use storefront_common::MinorUnits;

use crate::{
    config::StripeConfig,
    data_objects::{ErrorResponse, PaymentIntent},
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let auth = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&auth).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_base.trim_end_matches('/'))
    }

    /// Creates a payment intent for `amount` in the configured currency.
    ///
    /// Stripe guarantees that requests carrying the same `idempotency_key` produce at most one payment intent, and
    /// replays the original response for repeats. Callers retrying a purchase must therefore re-use the key.
    pub async fn create_payment_intent(
        &self,
        amount: MinorUnits,
        idempotency_key: &str,
    ) -> Result<PaymentIntent, StripeApiError> {
        if amount.value() <= 0 {
            return Err(StripeApiError::InvalidAmount(amount.to_string()));
        }
        let url = self.url("/payment_intents");
        let form = [("amount", amount.value().to_string()), ("currency", self.config.currency.clone())];
        debug!("💳️ Creating payment intent for {amount} with idempotency key {idempotency_key}");
        let response = self
            .client
            .post(url)
            .header("Idempotency-Key", idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!("💳️ Payment intent request did not complete. {e}");
                StripeApiError::Unavailable(e.to_string())
            })?;
        let status = response.status();
        if status.is_success() {
            let intent =
                response.json::<PaymentIntent>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))?;
            info!("💳️ Payment intent {} created for {amount}", intent.id);
            Ok(intent)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|r| format!("{} ({})", r.error.message, r.error.error_type))
                .unwrap_or(body);
            warn!("💳️ Payment intent request failed with {status}. {message}");
            Err(classify_failure(status, message))
        }
    }
}

/// Client errors mean Stripe looked at the request and said no. Rate limiting, request timeouts and server errors
/// say nothing about whether the charge is acceptable, so they count as "unavailable".
pub(crate) fn classify_failure(status: StatusCode, message: String) -> StripeApiError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => StripeApiError::Unavailable(message),
        s if s.is_client_error() => StripeApiError::Rejected { status: s.as_u16(), message },
        _ => StripeApiError::Unavailable(message),
    }
}
