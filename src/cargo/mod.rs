//! Cargo workspace integration
//!
//! - **metadata**: load the workspace model from `cargo metadata`
//! - **manifest**: read and rewrite Cargo.toml files without losing formatting

pub mod manifest;
pub mod metadata;
