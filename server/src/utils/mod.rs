//! Utility modules

pub mod crypto;
pub mod file;
