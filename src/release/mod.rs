//! Publish orchestration
//!
//! A `lading publish` run moves through four stages, each a separate module:
//!
//! - **plan**: decide which crates are published and in what order
//! - **staging**: copy the workspace into an isolated build directory
//! - **preflight**: verify the staged copy (clean tree, `cargo check`, `cargo test`)
//! - **report**: summarise the plan and staging result
//!
//! Nothing here uploads to a registry.

pub mod plan;
pub mod preflight;
pub mod report;
pub mod staging;
