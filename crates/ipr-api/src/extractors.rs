//! # Request Body Helpers
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and pass it through
//! [`extract_json`] so every malformed body, oversized body, or missing
//! content type surfaces as the same 422 `BAD_REQUEST` envelope instead of
//! axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Payload rules that serde cannot express (non-empty strings and the like).
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn describe(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "expected a request body with content-type application/json".to_string()
        }
        JsonRejection::BytesRejection(_) => {
            format!("request body could not be read (limit {} bytes)", crate::MAX_BODY_BYTES)
        }
        other => other.body_text(),
    }
}

/// Unwrap a JSON body or turn the rejection into [`AppError::BadRequest`].
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(status = %rejection.status(), "rejected request body");
            Err(AppError::BadRequest(describe(&rejection)))
        }
    }
}

/// [`extract_json`] followed by the payload's own [`Validate`] rules.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let payload = extract_json(body)?;
    payload.validate().map_err(AppError::Validation)?;
    Ok(payload)
}
