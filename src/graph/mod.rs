//! Workspace dependency model
//!
//! Built on cargo_metadata + petgraph. Only workspace members are nodes.

pub mod workspace_graph;

pub use workspace_graph::WorkspaceGraph;
