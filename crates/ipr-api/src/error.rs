//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`IprError`] from the registry core to HTTP status codes and
//! returns JSON error bodies with a machine-readable code, a message, and
//! optional details. Internal error details are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ipr_core::{FieldViolation, IprError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details. For field validation failures this carries
    /// `{"violations": [{"field", "reason"}, ...]}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request-level validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// One or more entry fields were rejected (422, with violations).
    #[error("{0}")]
    InvalidFields(ValidationError),

    /// Request body could not be parsed (422).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the admin role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Attempt to delete a system option (403).
    #[error("forbidden: {0}")]
    ForbiddenDelete(String),

    /// The (category, value) pair already exists (409).
    #[error("conflict: {0}")]
    DuplicateOption(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),

    /// Counter or record store unreachable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::InvalidFields(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::ForbiddenDelete(_) => (StatusCode::FORBIDDEN, "FORBIDDEN_DELETE"),
            Self::DuplicateOption(_) => (StatusCode::CONFLICT, "DUPLICATE_OPTION"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidFields(err) => {
                let violations: &[FieldViolation] = err.violations();
                Some(serde_json::json!({ "violations": violations }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<IprError> for AppError {
    fn from(err: IprError) -> Self {
        match err {
            IprError::Validation(v) => Self::InvalidFields(v),
            e @ IprError::DuplicateOption { .. } => Self::DuplicateOption(e.to_string()),
            e @ IprError::ForbiddenDelete { .. } => Self::ForbiddenDelete(e.to_string()),
            e @ IprError::Forbidden { .. } => Self::Forbidden(e.to_string()),
            e @ IprError::NotFound { .. } => Self::NotFound(e.to_string()),
            IprError::StoreUnavailable(msg) => Self::ServiceUnavailable(msg),
            IprError::Persistence(msg) => Self::Internal(msg),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidFields(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use ipr_core::{Category, EntryField};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn not_found_status_code() {
        let (status, code) = AppError::NotFound("entry x".into()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn bad_request_is_unprocessable() {
        let (status, code) = AppError::BadRequest("eof".into()).status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "BAD_REQUEST");
    }

    #[test]
    fn domain_errors_map_to_expected_codes() {
        let cases: Vec<(IprError, StatusCode, &str)> = vec![
            (
                IprError::DuplicateOption {
                    category: Category::ClientCode,
                    value: "HFEX".into(),
                },
                StatusCode::CONFLICT,
                "DUPLICATE_OPTION",
            ),
            (
                IprError::ForbiddenDelete {
                    category: Category::ClientCode,
                    value: "HFEX".into(),
                },
                StatusCode::FORBIDDEN,
                "FORBIDDEN_DELETE",
            ),
            (
                IprError::forbidden("update entry"),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
            (
                IprError::entry_not_found("abc"),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                IprError::StoreUnavailable("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                IprError::Persistence("constraint".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status_and_code(), (status, code));
        }
    }

    #[tokio::test]
    async fn validation_body_lists_violations() {
        let err: AppError = IprError::from(ValidationError::new(vec![
            FieldViolation::new(EntryField::ClientCode, "must be 2-4 characters (got 1)"),
            FieldViolation::new(EntryField::CapacityMw, "must be greater than 0"),
        ]))
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let violations = body["error"]["details"]["violations"].as_array().unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0]["field"], "CLIENT_CODE");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("CAPACITY_MW"));
    }

    #[tokio::test]
    async fn internal_message_not_exposed() {
        let (status, body) = body_json(AppError::Internal("db password wrong".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("details").is_none());
    }
}
