use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::dtos::ErrorBody;
use crate::processor::ProcessorError;

/// Everything that can go wrong while creating a payment intent.
///
/// The `Display` text is exactly what the caller sees. Processor failures
/// deliberately collapse into one generic sentence; the wrapped error is only
/// reachable through `source()` for logging.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Minimum payment amount is $5.00")]
    AmountTooLow,
    #[error("Payment amount exceeds package price")]
    AmountTooHigh,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Failed to create payment intent. Please try again.")]
    Processor(#[source] ProcessorError),
}

impl PaymentError {
    pub fn status(&self) -> StatusCode {
        match self {
            PaymentError::AmountTooLow
            | PaymentError::AmountTooHigh
            | PaymentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PaymentError::Processor(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProcessorError> for PaymentError {
    fn from(err: ProcessorError) -> Self {
        PaymentError::Processor(err)
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}

/// JSON extractor that reports malformed bodies as `400 {"error": ...}`
/// instead of axum's plain-text 415/422 rejections.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PaymentError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                warn!("rejected malformed payment request: {message}");
                Err(PaymentError::InvalidRequest(message))
            }
        }
    }
}
