//! Build the workspace model from `cargo metadata`
//!
//! `cargo metadata --no-deps` is run through `cargo_metadata`, whose typed
//! structures do the strict deserialization. This module only turns them into
//! our own `WorkspaceGraph`, rejecting shapes the model cannot represent.

use crate::core::error::{LadingResult, WorkspaceModelError};
use crate::graph::workspace_graph::{DependencyKind, WorkspaceCrate, WorkspaceDependency, WorkspaceGraph};
use crate::utils::normalise_workspace_root;
use cargo_metadata::{Metadata, MetadataCommand, Package, PackageId};
use std::collections::HashMap;
use std::path::Path;
use toml_edit::DocumentMut;

/// Load the workspace rooted at `workspace_root`.
pub fn load_workspace(workspace_root: &Path) -> LadingResult<WorkspaceGraph> {
  let root = normalise_workspace_root(workspace_root)?;
  log::debug!("running cargo metadata for {}", root.display());

  let metadata = MetadataCommand::new()
    .manifest_path(root.join("Cargo.toml"))
    .current_dir(&root)
    .no_deps()
    .exec()?;

  let graph = build_workspace_graph(&metadata)?;
  log::debug!(
    "workspace {} has {} member crate(s)",
    graph.workspace_root().display(),
    graph.crates.len()
  );
  match graph.topologically_sorted_crates() {
    Ok(order) => {
      let names: Vec<&str> = order.iter().map(|krate| krate.name.as_str()).collect();
      log::debug!("dependency order: {}", names.join(", "));
    }
    // Reported with full context when a publish plan is built
    Err(cycle) => log::debug!("{}", cycle),
  }
  Ok(graph)
}

/// Convert parsed metadata into a `WorkspaceGraph`.
pub fn build_workspace_graph(metadata: &Metadata) -> Result<WorkspaceGraph, WorkspaceModelError> {
  let packages: HashMap<&PackageId, &Package> = metadata.packages.iter().map(|pkg| (&pkg.id, pkg)).collect();

  let mut members = Vec::with_capacity(metadata.workspace_members.len());
  for id in &metadata.workspace_members {
    let package = packages.get(id).copied().ok_or_else(|| {
      WorkspaceModelError::invalid(format!("workspace member {} is missing from the package list", id.repr))
    })?;
    members.push(package);
  }

  // Name -> id among members only; anything else is an external dependency
  let member_ids: HashMap<&str, &PackageId> = members
    .iter()
    .map(|pkg| {
      let name: &str = pkg.name.as_ref();
      (name, &pkg.id)
    })
    .collect();

  let mut crates = Vec::with_capacity(members.len());
  for package in members {
    crates.push(convert_package(package, &member_ids)?);
  }

  WorkspaceGraph::new(metadata.workspace_root.clone().into_std_path_buf(), crates)
}

fn convert_package(package: &Package, member_ids: &HashMap<&str, &PackageId>) -> Result<WorkspaceCrate, WorkspaceModelError> {
  let manifest_path = package.manifest_path.clone().into_std_path_buf();
  let root_path = manifest_path
    .parent()
    .map(Path::to_path_buf)
    .ok_or_else(|| WorkspaceModelError::invalid(format!("manifest path {} has no parent", manifest_path.display())))?;

  let package_name: &str = package.name.as_ref();
  let mut dependencies = Vec::new();
  for dep in &package.dependencies {
    let kind = convert_kind(&dep.kind).ok_or_else(|| {
      WorkspaceModelError::invalid(format!(
        "unsupported dependency kind for {} -> {}: {:?}",
        package_name, dep.name, dep.kind
      ))
    })?;

    let Some(target) = member_ids.get(dep.name.as_str()) else {
      continue;
    };

    dependencies.push(WorkspaceDependency {
      package_id: target.repr.clone(),
      name: dep.name.clone(),
      manifest_name: dep.rename.clone().unwrap_or_else(|| dep.name.clone()),
      kind,
    });
  }

  Ok(WorkspaceCrate {
    id: package.id.repr.clone(),
    name: package_name.to_string(),
    version: package.version.to_string(),
    readme_is_workspace: manifest_readme_is_workspace(&manifest_path)?,
    manifest_path,
    root_path,
    publish: publish_allowed(package.publish.as_deref()),
    dependencies,
  })
}

/// `publish` as reported by cargo: absent means any registry, an empty list means none
pub fn publish_allowed(publish: Option<&[String]>) -> bool {
  match publish {
    None => true,
    Some(registries) => !registries.is_empty(),
  }
}

fn convert_kind(kind: &cargo_metadata::DependencyKind) -> Option<DependencyKind> {
  match kind {
    cargo_metadata::DependencyKind::Normal => Some(DependencyKind::Normal),
    cargo_metadata::DependencyKind::Development => Some(DependencyKind::Dev),
    cargo_metadata::DependencyKind::Build => Some(DependencyKind::Build),
    _ => None,
  }
}

fn manifest_readme_is_workspace(manifest_path: &Path) -> Result<bool, WorkspaceModelError> {
  let content = std::fs::read_to_string(manifest_path)
    .map_err(|e| WorkspaceModelError::invalid(format!("failed to read {}: {}", manifest_path.display(), e)))?;
  let doc = content
    .parse::<DocumentMut>()
    .map_err(|e| WorkspaceModelError::invalid(format!("failed to parse {}: {}", manifest_path.display(), e)))?;
  Ok(crate::cargo::manifest::readme_is_workspace(&doc))
}
