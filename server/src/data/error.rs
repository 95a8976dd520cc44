//! Data layer error type

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl DataError {
    pub fn project_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Project",
            id,
        }
    }

    pub fn log_file_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Log file",
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
