//! The wire error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use tabsplit_core::SplitError;

/// A handler error as it goes over the wire:
/// `{ ok: false, code, message, details? }` plus an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_configured(what: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "NOT_CONFIGURED",
            format!("{what} is not configured"),
        )
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        let code = err.code();
        match err {
            SplitError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, code, msg),
            SplitError::NotFound(what) => {
                Self::new(StatusCode::NOT_FOUND, code, format!("{what} not found"))
            }
            SplitError::RateLimited => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                code,
                "too many requests, slow down",
            ),
            SplitError::NotConfigured(what) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                format!("{what} is not configured"),
            ),
            SplitError::Timeout(msg) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, msg)
            }
            SplitError::Provider { provider, message } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                format!("{provider} request failed"),
            )
            .with_details(message),
            SplitError::Storage(message) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, "storage request failed")
                    .with_details(message)
            }
            SplitError::Other(e) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, "internal error")
                    .with_details(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "ok": false,
            "code": self.code,
            "message": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}
