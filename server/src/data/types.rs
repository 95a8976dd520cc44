//! Stored record types

use std::path::PathBuf;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded raw trace log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileRow {
    pub id: i64,
    pub project_id: i64,
    pub file_name: String,
    pub file_path: PathBuf,
    /// SHA-256 of the raw file
    pub checksum: Option<String>,
    pub processed_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewLogFile {
    pub project_id: i64,
    pub file_name: String,
    pub file_path: PathBuf,
    pub checksum: Option<String>,
}

/// Result of a completed filter run over one log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredFileRow {
    pub id: i64,
    pub log_file_id: i64,
    pub filtered_file_name: String,
    pub filtered_file_path: PathBuf,
    /// SHA-256 of the filtered file
    pub checksum: String,
    pub processed_time: DateTime<Utc>,
}

/// A deleted log file together with the filtered records removed with it
#[derive(Debug, Clone)]
pub struct RemovedLogFile {
    pub log_file: LogFileRow,
    pub filtered_files: Vec<FilteredFileRow>,
}
