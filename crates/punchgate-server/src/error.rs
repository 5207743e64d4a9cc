//! Gateway error type and its HTTP rendering.
//!
//! Validation failures are answered with 400 and a short envelope:
//!
//! ```json
//! { "success": false, "message": "Invalid date format. Use MM/DD/YYYY" }
//! ```
//!
//! Everything else is a 500 carrying a machine-readable code and the
//! underlying cause:
//!
//! ```json
//! {
//!   "success": false,
//!   "message": "Failed to connect to device after retry: Connection timeout after 5000ms",
//!   "error": { "code": "CONNECTION_ERROR", "detail": "Connection timeout after 5000ms" }
//! }
//! ```

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tokio::task::JoinError;

use punchgate_device::DeviceError;

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced by the gateway to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The device could not be reached, even after the reconnect attempt.
    #[error("Failed to connect to device after retry: {0}")]
    Connection(#[source] DeviceError),

    /// A `from`/`to` query parameter is not a date.
    #[error("Invalid date format. Use MM/DD/YYYY")]
    InvalidDate { value: String },

    /// The query string could not be deserialized.
    #[error("Invalid query parameters")]
    InvalidQuery(#[from] QueryRejection),

    /// The device operation failed after the session was opened.
    #[error("{0}")]
    DeviceCall(#[source] DeviceError),

    /// The device answered with a payload that cannot be decoded.
    #[error("Device returned invalid or no log data.")]
    InvalidDeviceResponse(#[source] DeviceError),

    /// The task driving the device session panicked or was aborted.
    #[error("Device task failed: {0}")]
    Task(#[from] JoinError),
}

impl GatewayError {
    /// Classify a failure of an open session.
    pub fn device_call(err: DeviceError) -> Self {
        if err.is_invalid_response() {
            Self::InvalidDeviceResponse(err)
        } else {
            Self::DeviceCall(err)
        }
    }

    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDate { .. } | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code reported in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::DeviceCall(_) => "DEVICE_CALL_ERROR",
            Self::InvalidDeviceResponse(_) => "INVALID_DEVICE_RESPONSE",
            Self::Task(_) => "TASK_ERROR",
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Connection(err) | Self::DeviceCall(err) | Self::InvalidDeviceResponse(err) => {
                err.to_string()
            }
            Self::InvalidDate { value } => value.clone(),
            Self::InvalidQuery(rejection) => rejection.body_text(),
            Self::Task(err) => err.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status == StatusCode::BAD_REQUEST {
            tracing::debug!(code = self.code(), detail = %self.detail(), "Rejected request");
            json!({
                "success": false,
                "message": self.to_string(),
            })
        } else {
            tracing::error!(code = self.code(), error = %self, "Request failed");
            json!({
                "success": false,
                "message": self.to_string(),
                "error": {
                    "code": self.code(),
                    "detail": self.detail(),
                },
            })
        };

        (status, Json(body)).into_response()
    }
}
