//! Core building blocks shared by every command
//!
//! - **config**: `lading.toml` parsing and validation
//! - **context**: workspace context built once per invocation
//! - **error**: error types with contextual help messages and exit codes

pub mod config;
pub mod context;
pub mod error;
