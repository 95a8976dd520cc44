//! Background filter jobs
//!
//! Each uploaded log is filtered off the request path. The queue bounds how
//! many filter runs execute at once, records each result in the repository
//! and keeps a per-log status that the API exposes.

mod queue;

pub use queue::{FilterJob, FilterJobQueue, JobError, JobHandle, JobStatus};
