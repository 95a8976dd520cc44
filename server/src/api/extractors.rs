//! Path and validation extractors for API routes

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Record ids are sequential and start at 1
pub fn is_valid_id(id: i64) -> bool {
    id > 0
}

/// Raw path extractor for project-scoped routes (internal use)
#[derive(Debug, Deserialize)]
struct ProjectPathRaw {
    project_id: i64,
}

/// Validated project path extractor.
///
/// Extracts and validates `project_id` from URL path parameters.
/// Returns a 400 Bad Request if validation fails.
#[derive(Debug)]
pub struct ProjectPath {
    pub project_id: i64,
}

impl<S> FromRequestParts<S> for ProjectPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<ProjectPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_id(raw.project_id) {
            return Err(ValidationRejection::InvalidProjectId);
        }

        Ok(Self {
            project_id: raw.project_id,
        })
    }
}

/// Raw path extractor for log file routes (internal use)
#[derive(Debug, Deserialize)]
struct LogFilePathRaw {
    project_id: i64,
    file_id: i64,
}

/// Validated log file path extractor (`project_id` and `file_id`).
#[derive(Debug)]
pub struct LogFilePath {
    pub project_id: i64,
    pub file_id: i64,
}

impl<S> FromRequestParts<S> for LogFilePath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<LogFilePathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_id(raw.project_id) {
            return Err(ValidationRejection::InvalidProjectId);
        }
        if !is_valid_id(raw.file_id) {
            return Err(ValidationRejection::InvalidFileId);
        }

        Ok(Self {
            project_id: raw.project_id,
            file_id: raw.file_id,
        })
    }
}

/// Rejection for path/body extraction and validation failures
#[derive(Debug)]
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Non-positive project_id
    InvalidProjectId,
    /// Non-positive file_id
    InvalidFileId,
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Path(rejection) => (
                StatusCode::BAD_REQUEST,
                "PATH_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidProjectId => (
                StatusCode::BAD_REQUEST,
                "INVALID_PROJECT_ID",
                "Invalid project_id: must be a positive integer".to_string(),
            ),
            Self::InvalidFileId => (
                StatusCode::BAD_REQUEST,
                "INVALID_FILE_ID",
                "Invalid file_id: must be a positive integer".to_string(),
            ),
            Self::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                "JSON_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON body extractor with automatic validation.
///
/// Deserializes JSON body and validates it using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}
