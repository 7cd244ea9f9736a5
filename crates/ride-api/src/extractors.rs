//! # Request Extraction & Validation
//!
//! The [`Validate`] trait for request DTOs and helpers that turn axum
//! rejections into [`AppError`]s, so every malformed body or query comes
//! back in the standard error envelope.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::AppError;

/// Business-rule validation beyond what serde checks.
pub trait Validate {
    /// Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract and validate query parameters.
pub fn extract_validated_query<T: Validate>(
    result: Result<Query<T>, QueryRejection>,
) -> Result<T, AppError> {
    let Query(value) = result.map_err(|err| AppError::BadRequest(err.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract a path parameter, mapping rejections to [`AppError::BadRequest`].
pub fn extract_path<T>(
    result: Result<axum::extract::Path<T>, axum::extract::rejection::PathRejection>,
) -> Result<T, AppError> {
    result
        .map(|axum::extract::Path(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
