//! Shared API types
//!
//! Common error handling used across all API endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::DataError;
use crate::domain::filter::FilterError;
use crate::domain::graph::GraphError;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { code: String, message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "INTERNAL".to_string(),
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn project_not_found(project_id: i64) -> Self {
        Self::not_found(
            "PROJECT_NOT_FOUND",
            format!("Project not found: {}", project_id),
        )
    }

    pub fn log_file_not_found(log_file_id: i64) -> Self {
        Self::not_found(
            "LOG_FILE_NOT_FOUND",
            format!("Log file not found: {}", log_file_id),
        )
    }

    pub fn from_data(e: DataError) -> Self {
        match e {
            DataError::NotFound { .. } => Self::not_found("NOT_FOUND", e.to_string()),
            DataError::Conflict(message) => Self::conflict("CONFLICT", message),
        }
    }

    /// Filter strings that cannot be parsed are the client's fault
    pub fn from_filter(e: FilterError) -> Self {
        match e {
            FilterError::InvalidColumn { .. }
            | FilterError::InvalidPattern { .. }
            | FilterError::InvalidFilterSet(_) => Self::bad_request("INVALID_FILTER", e.to_string()),
            other => {
                tracing::error!(error = %other, "Filter error");
                Self::internal("Filter operation failed")
            }
        }
    }

    /// A graph build either succeeds for every log or fails the request
    pub fn from_graph(e: GraphError) -> Self {
        tracing::error!(error = %e, "Graph build failed");
        Self::Internal {
            code: "GRAPH_BUILD_FAILED".to_string(),
            message: e.to_string(),
        }
    }

    pub fn from_io(e: std::io::Error) -> Self {
        tracing::error!(error = %e, "IO error");
        Self::internal("File operation failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, "conflict", code, message),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { code, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                code,
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
