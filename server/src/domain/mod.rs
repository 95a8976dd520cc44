//! Domain logic for trace log dataflow analysis
//!
//! - `filter` - `@@@` filter language and the raw → processed log pipeline
//! - `trace` - column schema and open-call record parsing
//! - `graph` - program/file dataflow graph construction
//! - `jobs` - bounded background filter jobs

pub mod filter;
pub mod graph;
pub mod jobs;
pub mod trace;

pub use filter::{FilterError, FilterSet, filter_file};
pub use graph::{Graph, GraphError, build_graph};
pub use jobs::{FilterJob, FilterJobQueue, JobStatus};
pub use trace::{TraceRecordParser, TraceSchema};
