//! Error types for the HTTP gateway and the service facade.

use http::StatusCode;
use soldo::SoldoError;
use soldo::error::InvalidArgumentError;

/// Errors that can occur while talking to the Soldo API.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The API answered `400 Bad Request`.
    #[error("Bad request: {body}")]
    BadRequest {
        /// The response body.
        body: String,
    },

    /// The API answered `401 Unauthorized`.
    #[error("Unauthorized: {body}")]
    Unauthorized {
        /// The response body.
        body: String,
    },

    /// The API answered `404 Not Found`.
    #[error("Not found: {body}")]
    NotFound {
        /// The response body.
        body: String,
    },

    /// The API answered `405 Method Not Allowed`.
    #[error("Method not allowed: {body}")]
    MethodNotAllowed {
        /// The response body.
        body: String,
    },

    /// The API answered with a 5xx status.
    #[error("Server error {status}: {body}")]
    ServerError {
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },

    /// Any other non-success status.
    #[error("Unexpected HTTP status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Transport {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    Url {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The response body is not a JSON object.
    #[error("Invalid response: {context}: {reason}")]
    InvalidResponse {
        /// Human-readable context.
        context: &'static str,
        /// What was wrong with the body.
        reason: String,
    },

    /// Credentials were rejected or the token response was incomplete.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Client configuration is missing or invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Resource-level failure while building a request or a response.
    #[error(transparent)]
    Resource(#[from] SoldoError),
}

impl HttpError {
    /// Maps a non-success status and its body to the matching variant.
    #[must_use]
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest { body },
            StatusCode::UNAUTHORIZED => Self::Unauthorized { body },
            StatusCode::NOT_FOUND => Self::NotFound { body },
            StatusCode::METHOD_NOT_ALLOWED => Self::MethodNotAllowed { body },
            status if status.is_server_error() => Self::ServerError { status, body },
            status => Self::Status { status, body },
        }
    }

    /// Returns the HTTP status that caused the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::BadRequest { .. } => Some(StatusCode::BAD_REQUEST),
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::MethodNotAllowed { .. } => Some(StatusCode::METHOD_NOT_ALLOWED),
            Self::ServerError { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::Resource(InvalidArgumentError::new(reason).into())
    }
}
