//! Repository trait for the record store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::error::DataError;
use crate::data::types::{FilteredFileRow, LogFileRow, NewLogFile, ProjectRow, RemovedLogFile};

/// Projects, their uploaded logs and the filter results of those logs.
///
/// Listing methods return records in insertion (upload) order.
#[async_trait]
pub trait LogRepository: Send + Sync {
    // ==================== Projects ====================

    /// Create a project; names are unique
    async fn create_project(&self, name: &str) -> Result<ProjectRow, DataError>;

    async fn list_projects(&self) -> Result<Vec<ProjectRow>, DataError>;

    async fn get_project(&self, project_id: i64) -> Result<Option<ProjectRow>, DataError>;

    async fn get_project_by_name(&self, name: &str) -> Result<Option<ProjectRow>, DataError>;

    /// Delete a project with all its log and filtered records
    async fn delete_project(&self, project_id: i64) -> Result<Option<ProjectRow>, DataError>;

    // ==================== Log files ====================

    /// Add a log file; file names are unique within a project
    async fn add_log_file(&self, log_file: NewLogFile) -> Result<LogFileRow, DataError>;

    async fn get_log_file(&self, log_file_id: i64) -> Result<Option<LogFileRow>, DataError>;

    async fn list_log_files(&self, project_id: i64) -> Result<Vec<LogFileRow>, DataError>;

    /// Delete a log file of a project with its filtered records
    async fn delete_log_file(
        &self,
        project_id: i64,
        log_file_id: i64,
    ) -> Result<Option<RemovedLogFile>, DataError>;

    // ==================== Filter results ====================

    /// Store the result of a successful filter run
    async fn record_filter_result(
        &self,
        log_file_id: i64,
        filtered_path: &Path,
        checksum: &str,
        processed_time: DateTime<Utc>,
    ) -> Result<FilteredFileRow, DataError>;

    async fn list_filtered_files(&self, project_id: i64)
    -> Result<Vec<FilteredFileRow>, DataError>;

    /// Newest filtered file of each log, in upload order; logs without one are skipped
    async fn filtered_log_paths(&self, project_id: i64) -> Result<Vec<PathBuf>, DataError>;
}
