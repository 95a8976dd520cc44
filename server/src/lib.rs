//! TraceGraph server
//!
//! Filters raw system-call trace logs with `@@@` column filters and builds
//! program/file dataflow graphs from the filtered logs.

pub mod api;
mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
