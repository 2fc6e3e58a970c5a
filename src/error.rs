//! Gateway error types.
//!
//! [`GatewayError`] is the central error type. Session code uses
//! [`GatewayError::is_fatal`] to decide whether a failure ends the
//! connection; the REST inspection endpoints turn it into a structured JSON
//! error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::SubscriptionId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "subscription not found: 67e55044-10b1-426f-9247-bb680e5fe0c8"
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Gateway error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category           | Ends session |
/// |-----------|--------------------|--------------|
/// | 1000–1999 | Message decoding   | no           |
/// | 2000–2999 | Lookup             | no           |
/// | 3000–3999 | Transport          | yes          |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Payload is not valid JSON, lacks `MessageType`, or does not match the
    /// shape of the variant its `MessageType` names.
    #[error("decode error: {0}")]
    Decode(String),

    /// No live subscription has the given id.
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    /// Socket-level failure while reading or writing.
    #[error("transport error: {0}")]
    Transport(String),

    /// Peer sent something the protocol does not allow (e.g. a binary frame).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A response write did not complete within the send timeout.
    #[error("write timed out after {timeout_ms} ms")]
    WriteTimeout {
        /// The bound that was exceeded.
        timeout_ms: u64,
    },
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Decode(_) => 1001,
            Self::SubscriptionNotFound(_) => 2001,
            Self::Transport(_) => 3001,
            Self::ProtocolViolation(_) => 3002,
            Self::WriteTimeout { .. } => 3003,
        }
    }

    /// Returns `true` if a session hitting this error must close.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Decode(_) | Self::SubscriptionNotFound(_) => false,
            Self::Transport(_) | Self::ProtocolViolation(_) | Self::WriteTimeout { .. } => true,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode(_) | Self::ProtocolViolation(_) => StatusCode::BAD_REQUEST,
            Self::SubscriptionNotFound(_) => StatusCode::NOT_FOUND,
            Self::WriteTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<axum::Error> for GatewayError {
    fn from(err: axum::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
