//! API route handlers

pub mod graph;
pub mod health;
pub mod logs;
pub mod projects;
