use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Stripe rejected the request. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Stripe is unavailable: {0}")]
    Unavailable(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("Webhook signature is invalid. {0}")]
    SignatureInvalid(String),
    #[error("Webhook payload is malformed. {0}")]
    Malformed(String),
}
