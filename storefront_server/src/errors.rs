use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use order_engine::{traits::LedgerError, PurchaseError, ReconciliationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("A backend service is temporarily unavailable. {0}")]
    ServiceUnavailable(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    Unauthenticated(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Payment was declined. {0}")]
    PaymentDeclined(String),
    #[error("The payment was taken, but the order could not be saved. It will be reconciled manually. {0}")]
    LedgerWriteFailure(String),
    #[error("Invalid webhook signature. {0}")]
    InvalidSignature(String),
    #[error("Invalid webhook payload. {0}")]
    MalformedNotification(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::MalformedNotification(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::LedgerWriteFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PurchaseError> for ServerError {
    fn from(e: PurchaseError) -> Self {
        match e {
            PurchaseError::ValidationError(s) => Self::ValidationError(s),
            PurchaseError::ProductNotFound(id) => Self::NoRecordFound(format!("Product {id} does not exist")),
            PurchaseError::CatalogUnavailable(s) => Self::ServiceUnavailable(s),
            PurchaseError::GatewayRejected(s) => Self::PaymentDeclined(s),
            PurchaseError::GatewayUnavailable(s) => Self::ServiceUnavailable(s),
            e @ PurchaseError::LedgerWriteFailure { .. } => Self::LedgerWriteFailure(e.to_string()),
        }
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        use order_engine::traits::ReconciliationQueueError;
        match e {
            ReconciliationError::SignatureInvalid(s) => Self::InvalidSignature(s),
            ReconciliationError::Malformed(s) => Self::MalformedNotification(s),
            ReconciliationError::LedgerUnavailable(s) => Self::ServiceUnavailable(s),
            ReconciliationError::QueueError(ReconciliationQueueError::EntryNotFound(id)) => {
                Self::NoRecordFound(format!("Reconciliation entry {id} does not exist"))
            },
            ReconciliationError::QueueError(ReconciliationQueueError::Timeout(ms)) => {
                Self::ServiceUnavailable(format!("The reconciliation queue did not respond within {ms}ms"))
            },
            ReconciliationError::QueueError(e) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Timeout(_) => Self::ServiceUnavailable(e.to_string()),
            e => Self::BackendError(e.to_string()),
        }
    }
}
