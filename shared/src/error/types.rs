//! User-visible error and the response envelope

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned to API callers
///
/// Carries a stable [`ErrorCode`] and a message that is safe to show.
/// Storage and internal details never end up here; they are logged where the
/// domain error is converted.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }

    /// Attach a structured detail (order number, offending status...)
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Response envelope shared by every endpoint
///
/// `code` is 0 on success; on failure it is the [`ErrorCode`] and `data` is
/// absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: ErrorCode::Success.code(),
            message: ErrorCode::Success.message().to_string(),
            data: Some(data),
            details: None,
        }
    }
}

impl From<AppError> for ApiResponse<()> {
    fn from(err: AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        if self.code.category().is_system() {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        }
        (status, axum::Json(ApiResponse::from(self))).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_comes_from_code() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_failure_envelope_keeps_details() {
        let err = AppError::with_message(ErrorCode::InvalidStatusTransition, "Cannot ship")
            .with_detail("current", "cancelled")
            .with_detail("requested", "shipped");
        let body = ApiResponse::from(err);

        assert_eq!(body.code, 4002);
        assert_eq!(body.message, "Cannot ship");
        assert!(body.data.is_none());
        assert_eq!(body.details.unwrap()["current"], "cancelled");
    }

    #[test]
    fn test_success_envelope_omits_details() {
        let json = serde_json::to_value(ApiResponse::success(vec!["ORD-1"])).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"][0], "ORD-1");
        assert!(json.get("details").is_none());
    }
}
