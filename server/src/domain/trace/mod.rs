//! System-call trace records
//!
//! - `schema` - field → column table for the columnar trace format
//! - `parser` - open-family call detection, program/file/access-mode extraction

mod parser;
mod schema;

pub use parser::{AccessMode, NO_TARGET, OpenCall, OpenEvent, TraceError, TraceRecordParser};
pub use schema::{TraceField, TraceSchema};

#[cfg(test)]
pub(crate) use parser::tests::trace_line;
