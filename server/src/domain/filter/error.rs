//! Filter error types

use std::path::PathBuf;

use thiserror::Error;

/// A single record could not be evaluated against a filter set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("column {column} out of range (record has {available} columns)")]
    ColumnOutOfRange { column: usize, available: usize },

    #[error("filter '{filter}' has column {column} without a pattern")]
    UnpairedColumn { filter: String, column: String },
}

/// Errors from parsing filters or running the filter pipeline
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid column index '{token}' in filter '{filter}'")]
    InvalidColumn { filter: String, token: String },

    #[error("Invalid pattern '{pattern}' in filter '{filter}': {source}")]
    InvalidPattern {
        filter: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid filter set: {0}")]
    InvalidFilterSet(String),

    #[error("Malformed record at line {line}: {source}")]
    MalformedRecord {
        line: u64,
        #[source]
        source: RecordError,
    },

    #[error("Path is not inside a raw log area: {}", .0.display())]
    OutsideRawArea(PathBuf),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FilterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure came from the log contents rather than the filter or filesystem
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_display() {
        let err = FilterError::MalformedRecord {
            line: 7,
            source: RecordError::ColumnOutOfRange {
                column: 12,
                available: 3,
            },
        };
        assert_eq!(
            err.to_string(),
            "Malformed record at line 7: column 12 out of range (record has 3 columns)"
        );
        assert!(err.is_malformed_record());
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = FilterError::io(
            "/uploads/p_1/raw_logs/a.log",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/uploads/p_1/raw_logs/a.log"));
        assert!(!err.is_malformed_record());
    }
}
