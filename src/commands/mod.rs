//! CLI commands for lading
//!
//! - **bump**: set one version across the workspace manifests and docs
//! - **publish**: plan publication, stage the workspace and run pre-flight checks
//!
//! All commands accept `&WorkspaceContext` to avoid redundant workspace loads.

pub mod bump;
pub mod publish;

pub use bump::run_bump;
pub use publish::run_publish;
