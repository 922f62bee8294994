//! Workspace context: build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   WorkspaceContext::build() -> &WorkspaceContext
//!   |
//!   v
//! commands/publish.rs, bump.rs:
//!   fn run_*(ctx: &WorkspaceContext, ...)
//! ```

use crate::cargo::metadata::load_workspace;
use crate::core::config::LadingConfig;
use crate::core::error::LadingResult;
use crate::graph::workspace_graph::WorkspaceGraph;
use crate::utils::normalise_workspace_root;
use std::path::{Path, PathBuf};

/// Resolved workspace root, configuration and workspace model.
///
/// Built once at startup and passed by reference to commands. Nothing in it
/// is global; two contexts for different roots can coexist.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
  /// Canonical workspace root
  pub root: PathBuf,

  /// Workspace model built from `cargo metadata`
  pub graph: WorkspaceGraph,

  /// lading.toml
  pub config: LadingConfig,
}

impl WorkspaceContext {
  /// Resolve `workspace_root`, then load lading.toml and the workspace model.
  pub fn build(workspace_root: &Path) -> LadingResult<Self> {
    let root = normalise_workspace_root(workspace_root)?;
    let config = LadingConfig::load(&root)?;
    let graph = load_workspace(&root)?;
    log::debug!(
      "workspace context for {}: {} crate(s)",
      root.display(),
      graph.crates.len()
    );

    Ok(Self { root, graph, config })
  }

  pub fn workspace_root(&self) -> &Path {
    &self.root
  }
}
