//! Trace record parser
//!
//! Answers four questions about one raw record: is it an open-family call,
//! which program issued it, which file it targets and with what access mode.
//! All column lookups go through [`TraceSchema`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::schema::{TraceField, TraceSchema};

/// Target file reported for records that are not open-family calls
pub const NO_TARGET: &str = "NONE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("missing {field} column {column} (record has {available} columns)")]
    MissingColumn {
        field: TraceField,
        column: usize,
        available: usize,
    },
}

/// Open-family calls recognized in the call column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenCall {
    Open,
    Open64,
    Openat,
    Fopen,
    Fopen64,
    Fopenat,
    Freopen,
}

impl OpenCall {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "open" => Some(Self::Open),
            "open64" => Some(Self::Open64),
            "openat" => Some(Self::Openat),
            "fopen" => Some(Self::Fopen),
            "fopen64" => Some(Self::Fopen64),
            "fopenat" => Some(Self::Fopenat),
            "freopen" => Some(Self::Freopen),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Open64 => "open64",
            Self::Openat => "openat",
            Self::Fopen => "fopen",
            Self::Fopen64 => "fopen64",
            Self::Fopenat => "fopenat",
            Self::Freopen => "freopen",
        }
    }

    /// `*at` calls carry a directory descriptor before the path
    const fn is_at_variant(&self) -> bool {
        matches!(self, Self::Openat | Self::Fopenat)
    }

    /// Stdio calls take an `fopen` mode string instead of `O_*` flags
    const fn is_stdio(&self) -> bool {
        matches!(
            self,
            Self::Fopen | Self::Fopen64 | Self::Fopenat | Self::Freopen
        )
    }

    pub const fn path_field(&self) -> TraceField {
        if self.is_at_variant() {
            TraceField::OpenatPath
        } else {
            TraceField::OpenPath
        }
    }

    pub const fn mode_field(&self) -> TraceField {
        if self.is_at_variant() {
            TraceField::OpenatMode
        } else {
            TraceField::OpenMode
        }
    }

    /// Classify the raw mode token of this call
    pub fn access_mode(&self, mode: &str) -> AccessMode {
        if self.is_stdio() {
            if mode.contains('w') {
                AccessMode::Write
            } else if mode.contains('r') {
                AccessMode::Read
            } else {
                AccessMode::Unknown
            }
        } else if mode.contains("O_RDWR") {
            AccessMode::Write
        } else if mode.contains("O_RDONLY") {
            AccessMode::Read
        } else {
            AccessMode::Unknown
        }
    }
}

impl fmt::Display for OpenCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
    Unknown,
}

/// Fields of one open-family record, borrowed from the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenEvent<'a> {
    pub call: OpenCall,
    pub program: &'a str,
    pub path: &'a str,
    pub mode: AccessMode,
}

/// Stateless record parser bound to a column schema
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceRecordParser {
    schema: TraceSchema,
}

impl TraceRecordParser {
    pub fn new(schema: TraceSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &TraceSchema {
        &self.schema
    }

    fn column<'a>(&self, tokens: &[&'a str], field: TraceField) -> Result<&'a str, TraceError> {
        let column = self.schema.column(field);
        tokens
            .get(column)
            .copied()
            .ok_or(TraceError::MissingColumn {
                field,
                column,
                available: tokens.len(),
            })
    }

    fn open_call(&self, tokens: &[&str]) -> Result<Option<OpenCall>, TraceError> {
        Ok(OpenCall::from_token(self.column(tokens, TraceField::Call)?))
    }

    pub fn is_open_call(&self, record: &str) -> Result<bool, TraceError> {
        let tokens = tokenize(record);
        Ok(self.open_call(&tokens)?.is_some())
    }

    pub fn program_name<'a>(&self, record: &'a str) -> Result<&'a str, TraceError> {
        self.column(&tokenize(record), TraceField::Program)
    }

    /// Target path, or [`NO_TARGET`] if the record is not an open-family call
    pub fn target_file<'a>(&self, record: &'a str) -> Result<&'a str, TraceError> {
        let tokens = tokenize(record);
        match self.open_call(&tokens)? {
            Some(call) => self.column(&tokens, call.path_field()),
            None => Ok(NO_TARGET),
        }
    }

    pub fn access_mode(&self, record: &str) -> Result<AccessMode, TraceError> {
        let tokens = tokenize(record);
        match self.open_call(&tokens)? {
            Some(call) => Ok(call.access_mode(self.column(&tokens, call.mode_field())?)),
            None => Ok(AccessMode::Unknown),
        }
    }

    /// All fields in one pass; `None` for blank records and non-open calls
    pub fn parse<'a>(&self, record: &'a str) -> Result<Option<OpenEvent<'a>>, TraceError> {
        let tokens = tokenize(record);
        if tokens.is_empty() {
            return Ok(None);
        }
        let Some(call) = self.open_call(&tokens)? else {
            return Ok(None);
        };
        Ok(Some(OpenEvent {
            call,
            program: self.column(&tokens, TraceField::Program)?,
            path: self.column(&tokens, call.path_field())?,
            mode: call.access_mode(self.column(&tokens, call.mode_field())?),
        }))
    }
}

fn tokenize(record: &str) -> Vec<&str> {
    record.split_whitespace().collect()
}
