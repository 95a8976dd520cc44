//! Trace column schema
//!
//! The trace format is positional. Column positions live in one table so a
//! format change only touches configuration.
//!
//! | Field         | Default column |
//! |---------------|----------------|
//! | `program`     | 8              |
//! | `call`        | 12             |
//! | `open_path`   | 13             |
//! | `openat_path` | 14             |
//! | `open_mode`   | 14             |
//! | `openat_mode` | 15             |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named fields of a trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceField {
    Program,
    Call,
    OpenPath,
    OpenatPath,
    OpenMode,
    OpenatMode,
}

impl TraceField {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TraceField::Program => "program",
            TraceField::Call => "call",
            TraceField::OpenPath => "open_path",
            TraceField::OpenatPath => "openat_path",
            TraceField::OpenMode => "open_mode",
            TraceField::OpenatMode => "openat_mode",
        }
    }
}

impl fmt::Display for TraceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column index of every trace field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TraceSchema {
    pub program: usize,
    pub call: usize,
    /// Target path for `open`, `open64`, `fopen`, `fopen64`, `freopen`
    pub open_path: usize,
    /// Target path for `openat`, `fopenat`
    pub openat_path: usize,
    pub open_mode: usize,
    pub openat_mode: usize,
}

impl Default for TraceSchema {
    fn default() -> Self {
        Self {
            program: 8,
            call: 12,
            open_path: 13,
            openat_path: 14,
            open_mode: 14,
            openat_mode: 15,
        }
    }
}

impl TraceSchema {
    pub const fn column(&self, field: TraceField) -> usize {
        match field {
            TraceField::Program => self.program,
            TraceField::Call => self.call,
            TraceField::OpenPath => self.open_path,
            TraceField::OpenatPath => self.openat_path,
            TraceField::OpenMode => self.open_mode,
            TraceField::OpenatMode => self.openat_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let schema = TraceSchema::default();
        assert_eq!(schema.column(TraceField::Program), 8);
        assert_eq!(schema.column(TraceField::Call), 12);
        assert_eq!(schema.column(TraceField::OpenPath), 13);
        assert_eq!(schema.column(TraceField::OpenatPath), 14);
        assert_eq!(schema.column(TraceField::OpenMode), 14);
        assert_eq!(schema.column(TraceField::OpenatMode), 15);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let schema: TraceSchema = serde_json::from_str(r#"{"program": 2, "call": 5}"#).unwrap();
        assert_eq!(schema.program, 2);
        assert_eq!(schema.call, 5);
        assert_eq!(schema.open_path, 13);
        assert_eq!(schema.openat_mode, 15);
    }

    #[test]
    fn test_field_display() {
        assert_eq!(TraceField::OpenatPath.to_string(), "openat_path");
    }
}
