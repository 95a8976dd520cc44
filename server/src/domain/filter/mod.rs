//! Trace log filtering
//!
//! - `matcher` - `@@@` filter language and per-record evaluation
//! - `pipeline` - streams a raw log through a filter set into the processed area
//! - `error` - filter parse, match and IO failures

mod error;
mod matcher;
mod pipeline;

pub use error::{FilterError, RecordError};
pub use matcher::{FILTER_SEPARATOR, Filter, FilterSet, matches};
pub use pipeline::{
    FilterOutcome, PROCESSED_LOGS_DIR, RAW_LOGS_DIR, filter_file, filtered_path_for,
};
