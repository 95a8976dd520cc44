//! Log file API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::data::{FilteredFileRow, LogFileRow};
use crate::domain::jobs::JobStatus;

/// Uploaded raw log
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogFileDto {
    pub id: i64,
    pub project_id: i64,
    pub file_name: String,
    pub file_path: String,
    /// Hex SHA-256 of the raw file
    pub checksum: Option<String>,
    pub processed_time: Option<DateTime<Utc>>,
}

impl From<LogFileRow> for LogFileDto {
    fn from(row: LogFileRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            file_name: row.file_name,
            file_path: row.file_path.display().to_string(),
            checksum: row.checksum,
            processed_time: row.processed_time,
        }
    }
}

/// Filtered log produced by a completed filter job
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilteredFileDto {
    pub id: i64,
    pub log_file_id: i64,
    pub filtered_file_name: String,
    pub filtered_file_path: String,
    /// Hex SHA-256 of the filtered file
    pub checksum: String,
    pub processed_time: DateTime<Utc>,
}

impl From<FilteredFileRow> for FilteredFileDto {
    fn from(row: FilteredFileRow) -> Self {
        Self {
            id: row.id,
            log_file_id: row.log_file_id,
            filtered_file_name: row.filtered_file_name,
            filtered_file_path: row.filtered_file_path.display().to_string(),
            checksum: row.checksum,
            processed_time: row.processed_time,
        }
    }
}

/// Request body for uploading a raw log
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UploadLogRequest {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: String,

    /// Raw log contents
    pub content: String,

    /// Filters in `column@@@regex[@@@column@@@regex...]` form; matching records are removed
    #[serde(default)]
    pub filters: Vec<String>,
}

/// Filter job state of one log file
#[derive(Debug, Serialize, ToSchema)]
pub struct JobStatusDto {
    pub log_file_id: i64,
    pub status: JobStatus,
}
