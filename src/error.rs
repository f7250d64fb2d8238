//! Relay error types with numeric codes and HTTP status mapping.
//!
//! [`RelayError`] is the central error type for the relay. The policy
//! variants describe why the hub refused an event; the remaining variants
//! cover startup and admin-surface failures.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body returned by the admin API.
///
/// ```json
/// {
///   "error": {
///     "code": 3002,
///     "message": "hub is not running"
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

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category      |
/// |-----------|---------------|
/// | 1000–1999 | Admission     |
/// | 2000–2999 | Moderation    |
/// | 3000–3999 | Server        |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The connecting host holds an active ban.
    #[error("admission denied: banned for another {:.2} s", .remaining.as_secs_f64())]
    AdmissionDenied {
        /// Time left until the ban expires.
        remaining: Duration,
    },

    /// Data arrived from a connection that has no registered session.
    #[error("protocol violation: no session for {0}")]
    ProtocolViolation(SocketAddr),

    /// A message arrived before the minimum interval elapsed.
    #[error("rate violation: strike {strikes}")]
    RateViolation {
        /// Strike count after this violation.
        strikes: u32,
    },

    /// The payload was not valid UTF-8 text.
    #[error("malformed payload: strike {strikes}")]
    MalformedPayload {
        /// Strike count after this violation.
        strikes: u32,
    },

    /// The offending session exceeded the strike limit and was banned.
    #[error("strike limit exceeded after {strikes} strikes; host banned")]
    Banned {
        /// Strike count that triggered the ban.
        strikes: u32,
    },

    /// A write to a peer could not be queued or completed.
    #[error("delivery failure: {reason}")]
    DeliveryFailure {
        /// Why the write failed.
        reason: String,
    },

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The listening socket could not be bound.
    #[error("could not bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The hub task is gone and cannot accept events.
    #[error("hub is not running")]
    HubUnavailable,
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::AdmissionDenied { .. } => 1001,
            Self::ProtocolViolation(_) => 1002,
            Self::RateViolation { .. } => 2001,
            Self::MalformedPayload { .. } => 2002,
            Self::Banned { .. } => 2003,
            Self::DeliveryFailure { .. } => 3001,
            Self::HubUnavailable => 3002,
            Self::Config(_) => 3003,
            Self::Bind { .. } => 3004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::AdmissionDenied { .. } | Self::Banned { .. } => StatusCode::FORBIDDEN,
            Self::ProtocolViolation(_) | Self::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            Self::RateViolation { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::HubUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::DeliveryFailure { .. } | Self::Config(_) | Self::Bind { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` for the kinds that count as a strike against a session.
    #[must_use]
    pub const fn is_strike(&self) -> bool {
        matches!(
            self,
            Self::RateViolation { .. } | Self::MalformedPayload { .. } | Self::Banned { .. }
        )
    }
}

impl IntoResponse for RelayError {
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
