//! Record store for projects, uploaded logs and filtered logs
//!
//! The service only depends on the [`LogRepository`] trait. The bundled
//! backend keeps records in process memory.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use memory::MemoryRepository;
pub use traits::LogRepository;
pub use types::{FilteredFileRow, LogFileRow, NewLogFile, ProjectRow, RemovedLogFile};
