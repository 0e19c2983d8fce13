//! Error types for the webhook service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use soldo::SoldoError;
use soldo::error::{EventError, EventErrorKind};

/// Errors returned by the webhook route.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The request carried no usable fingerprint header.
    #[error("missing fingerprint header")]
    MissingFingerprint,

    /// The body is not JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// The envelope was rejected while building or verifying the event.
    #[error("{0}")]
    Rejected(#[from] SoldoError),
}

impl WebhookError {
    /// HTTP status reported for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingFingerprint
            | Self::Rejected(
                SoldoError::Fingerprint(_)
                | SoldoError::Event(EventError {
                    kind: EventErrorKind::FingerprintMismatch,
                    ..
                }),
            ) => StatusCode::UNAUTHORIZED,
            Self::InvalidBody(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
