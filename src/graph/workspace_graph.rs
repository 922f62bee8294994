//! Workspace model: member crates and the dependency edges between them
//!
//! ## Graph Structure
//!
//! - **Nodes**: workspace members only; external dependencies are not represented
//! - **Edges**: `A → B` in the petgraph sense means "B depends on A", so a
//!   topological walk yields dependencies before their dependents
//! - **Dev edges**: kept on the crates for display, but never part of ordering;
//!   dev-dependencies are stripped by `cargo publish`, so they cannot create a
//!   publish-time cycle
//!
//! The graph is immutable once built. It is constructed from `cargo metadata`
//! output by `crate::cargo::metadata`, or directly from values in tests.

use crate::core::error::{DependencyCycleError, WorkspaceModelError};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Section of the manifest a dependency is declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyKind {
  Normal,
  Dev,
  Build,
}

/// An edge to another workspace member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDependency {
  /// Target crate's package id
  pub package_id: String,
  /// Target crate's name
  pub name: String,
  /// Key used in the dependent's manifest (differs from `name` when renamed)
  pub manifest_name: String,
  pub kind: DependencyKind,
}

impl WorkspaceDependency {
  /// Whether this edge constrains publish order
  pub fn affects_publish_order(&self) -> bool {
    self.kind != DependencyKind::Dev
  }
}

/// A workspace member crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceCrate {
  pub id: String,
  pub name: String,
  pub version: String,
  pub manifest_path: PathBuf,
  pub root_path: PathBuf,
  /// Whether the manifest permits publication
  pub publish: bool,
  /// `readme.workspace = true` in the crate manifest
  pub readme_is_workspace: bool,
  pub dependencies: Vec<WorkspaceDependency>,
}

impl WorkspaceCrate {
  /// Dependencies that must be published before this crate
  pub fn publish_dependencies(&self) -> impl Iterator<Item = &WorkspaceDependency> {
    self.dependencies.iter().filter(|dep| dep.affects_publish_order())
  }
}

/// Immutable view of a Cargo workspace
#[derive(Debug, Clone)]
pub struct WorkspaceGraph {
  pub workspace_root: PathBuf,
  /// Member crates, sorted by name
  pub crates: Vec<WorkspaceCrate>,
}

impl WorkspaceGraph {
  /// Build a graph from member crates.
  ///
  /// Crate names must be unique. Dependencies whose target is not one of `crates`
  /// are dropped, since only workspace-internal edges matter for ordering.
  pub fn new(workspace_root: impl Into<PathBuf>, mut crates: Vec<WorkspaceCrate>) -> Result<Self, WorkspaceModelError> {
    let mut seen = HashSet::new();
    for krate in &crates {
      if !seen.insert(krate.name.as_str()) {
        return Err(WorkspaceModelError::invalid(format!(
          "duplicate workspace crate name '{}'",
          krate.name
        )));
      }
    }

    crates.sort_by(|a, b| a.name.cmp(&b.name));

    let member_ids: HashSet<String> = crates.iter().map(|krate| krate.id.clone()).collect();
    for krate in &mut crates {
      krate
        .dependencies
        .retain(|dep| member_ids.contains(&dep.package_id));
    }

    Ok(Self {
      workspace_root: workspace_root.into(),
      crates,
    })
  }

  pub fn workspace_root(&self) -> &Path {
    &self.workspace_root
  }

  pub fn crate_by_name(&self, name: &str) -> Option<&WorkspaceCrate> {
    self.crates.iter().find(|krate| krate.name == name)
  }

  pub fn crate_by_id(&self, id: &str) -> Option<&WorkspaceCrate> {
    self.crates.iter().find(|krate| krate.id == id)
  }

  pub fn crate_names(&self) -> BTreeSet<&str> {
    self.crates.iter().map(|krate| krate.name.as_str()).collect()
  }

  /// All crates ordered so that every crate follows its normal and build dependencies.
  ///
  /// Ties are broken by ascending crate name, so the result is deterministic.
  pub fn topologically_sorted_crates(&self) -> Result<Vec<&WorkspaceCrate>, DependencyCycleError> {
    let all: Vec<&WorkspaceCrate> = self.crates.iter().collect();
    dependency_order(&all).map_err(|crates| DependencyCycleError { crates })
  }
}

/// Kahn's algorithm over `crates`, considering only non-dev edges between them.
///
/// On failure returns the sorted names of the crates left unordered (the ones
/// on, or downstream of, a cycle).
pub(crate) fn dependency_order<'a>(crates: &[&'a WorkspaceCrate]) -> Result<Vec<&'a WorkspaceCrate>, Vec<String>> {
  let mut graph: DiGraph<&'a WorkspaceCrate, ()> = DiGraph::with_capacity(crates.len(), 0);
  let mut id_to_node: HashMap<&str, NodeIndex> = HashMap::with_capacity(crates.len());
  for krate in crates {
    let idx = graph.add_node(*krate);
    id_to_node.insert(krate.id.as_str(), idx);
  }

  for krate in crates {
    let Some(&dependent) = id_to_node.get(krate.id.as_str()) else {
      continue;
    };
    for dep in krate.publish_dependencies() {
      if let Some(&dependency) = id_to_node.get(dep.package_id.as_str()) {
        // update_edge: a crate listed as both normal and build dep is one constraint
        graph.update_edge(dependency, dependent, ());
      }
    }
  }

  let mut in_degree: HashMap<NodeIndex, usize> = graph
    .node_indices()
    .map(|idx| (idx, graph.neighbors_directed(idx, Direction::Incoming).count()))
    .collect();

  let mut ready: BinaryHeap<Reverse<(&'a str, NodeIndex)>> = in_degree
    .iter()
    .filter(|(_, degree)| **degree == 0)
    .map(|(&idx, _)| {
      let krate: &'a WorkspaceCrate = graph[idx];
      Reverse((krate.name.as_str(), idx))
    })
    .collect();

  let mut ordered: Vec<&'a WorkspaceCrate> = Vec::with_capacity(crates.len());
  while let Some(Reverse((_, idx))) = ready.pop() {
    ordered.push(graph[idx]);
    for next in graph.neighbors_directed(idx, Direction::Outgoing) {
      if let Some(degree) = in_degree.get_mut(&next) {
        *degree -= 1;
        if *degree == 0 {
          let krate: &'a WorkspaceCrate = graph[next];
          ready.push(Reverse((krate.name.as_str(), next)));
        }
      }
    }
  }

  if ordered.len() == crates.len() {
    return Ok(ordered);
  }

  let emitted: HashSet<&str> = ordered.iter().map(|krate| krate.id.as_str()).collect();
  let mut residual: Vec<String> = crates
    .iter()
    .filter(|krate| !emitted.contains(krate.id.as_str()))
    .map(|krate| krate.name.clone())
    .collect();
  residual.sort();
  Err(residual)
}


#[cfg(test)]
mod tests {
  use super::test_support::{krate, workspace};
  use super::*;

  fn names(crates: &[&WorkspaceCrate]) -> Vec<String> {
    crates.iter().map(|krate| krate.name.clone()).collect()
  }

  #[test]
  fn test_topological_order_respects_dependencies() {
    let ws = workspace(
      "/ws",
      vec![
        krate("gamma").depends_on("beta"),
        krate("beta").depends_on("alpha"),
        krate("alpha"),
      ],
    );
    let order = ws.topologically_sorted_crates().unwrap();
    assert_eq!(names(&order), vec!["alpha", "beta", "gamma"]);
  }

  #[test]
  fn test_ties_break_alphabetically() {
    let ws = workspace(
      "/ws",
      vec![krate("zeta"), krate("mu"), krate("alpha"), krate("omega").depends_on("zeta")],
    );
    let order = ws.topologically_sorted_crates().unwrap();
    assert_eq!(names(&order), vec!["alpha", "mu", "zeta", "omega"]);
  }

  #[test]
  fn test_dev_edges_do_not_create_cycles() {
    let ws = workspace(
      "/ws",
      vec![krate("alpha").dev_depends_on("beta"), krate("beta").depends_on("alpha")],
    );
    let order = ws.topologically_sorted_crates().unwrap();
    assert_eq!(names(&order), vec!["alpha", "beta"]);
  }

  #[test]
  fn test_build_edges_participate() {
    let ws = workspace("/ws", vec![krate("alpha").build_depends_on("beta"), krate("beta")]);
    let order = ws.topologically_sorted_crates().unwrap();
    assert_eq!(names(&order), vec!["beta", "alpha"]);
  }

  #[test]
  fn test_cycle_reports_sorted_residual() {
    let ws = workspace(
      "/ws",
      vec![
        krate("gamma").depends_on("beta"),
        krate("beta").depends_on("gamma"),
        krate("alpha"),
      ],
    );
    let err = ws.topologically_sorted_crates().unwrap_err();
    assert_eq!(err.crates, vec!["beta", "gamma"]);
    assert!(err.to_string().contains("beta, gamma"));
  }

  #[test]
  fn test_self_loop_is_a_cycle_of_one() {
    let ws = workspace("/ws", vec![krate("alpha").depends_on("alpha")]);
    let err = ws.topologically_sorted_crates().unwrap_err();
    assert_eq!(err.crates, vec!["alpha"]);
  }

  #[test]
  fn test_duplicate_edges_count_once() {
    let ws = workspace(
      "/ws",
      vec![krate("alpha").depends_on("beta").build_depends_on("beta"), krate("beta")],
    );
    let order = ws.topologically_sorted_crates().unwrap();
    assert_eq!(names(&order), vec!["beta", "alpha"]);
  }

  #[test]
  fn test_external_dependencies_are_dropped() {
    let ws = workspace("/ws", vec![krate("alpha").depends_on("serde")]);
    assert!(ws.crates[0].dependencies.is_empty());
  }

  #[test]
  fn test_duplicate_names_are_rejected() {
    let err = WorkspaceGraph::new("/ws", vec![krate("alpha").build(), krate("alpha").build()]).unwrap_err();
    assert!(err.to_string().contains("duplicate workspace crate name 'alpha'"));
  }

  #[test]
  fn test_lookups() {
    let ws = workspace("/ws", vec![krate("beta"), krate("alpha")]);
    assert_eq!(ws.crate_by_name("beta").map(|k| k.id.as_str()), Some("beta-id"));
    assert!(ws.crate_by_name("gamma").is_none());
    assert_eq!(ws.crate_by_id("alpha-id").map(|k| k.name.as_str()), Some("alpha"));
    assert!(ws.crate_by_id("alpha").is_none());
    assert_eq!(ws.crate_names().into_iter().collect::<Vec<_>>(), vec!["alpha", "beta"]);
    let names: Vec<&str> = ws.crates.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
  }

  #[test]
  fn test_empty_workspace() {
    let ws = workspace("/ws", vec![]);
    assert!(ws.topologically_sorted_crates().unwrap().is_empty());
  }
}
