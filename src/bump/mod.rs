//! Workspace-wide version bump
//!
//! `lading bump <version>` rewrites, without touching formatting:
//!
//! - the root manifest: `[workspace.package].version`, `[package].version` and
//!   `[workspace.dependencies]` entries that point at bumped crates
//! - every member manifest: `[package].version` (unless listed in
//!   `bump.exclude`) and dependency requirements on bumped crates
//! - Markdown files matched by `bump.documentation.globs`: TOML fences that
//!   depend on bumped crates
//!
//! Excluded crates keep their own version, but their requirements on other
//! crates are still refreshed.

pub mod documentation;

use crate::cargo::manifest::{
  assign_version, read_manifest, update_dependency_requirements, update_workspace_dependency_requirements,
  write_manifest,
};
use crate::core::config::BumpConfig;
use crate::core::error::{LadingError, LadingResult, ResultExt};
use crate::graph::workspace_graph::{WorkspaceCrate, WorkspaceGraph};
use crate::utils::display_relative;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Files changed (or, in a dry run, that would change) by a bump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
  pub version: String,
  pub dry_run: bool,
  /// Manifests, root first, then members by crate name
  pub manifests: Vec<PathBuf>,
  /// Documentation files, sorted
  pub documents: Vec<PathBuf>,
}

impl BumpOutcome {
  pub fn is_empty(&self) -> bool {
    self.manifests.is_empty() && self.documents.is_empty()
  }

  /// User-facing summary, paths relative to `workspace_root`
  pub fn message(&self, workspace_root: &Path) -> String {
    if self.is_empty() {
      let prefix = if self.dry_run { "Dry run; no" } else { "No" };
      return format!(
        "{} manifest changes required; all versions already {}.",
        prefix, self.version
      );
    }

    let count = self.manifests.len() + self.documents.len();
    let mut lines = vec![if self.dry_run {
      format!("Dry run; would update version to {} in {} manifest(s):", self.version, count)
    } else {
      format!("Updated version to {} in {} manifest(s):", self.version, count)
    }];
    for path in &self.manifests {
      lines.push(format!("- {}", display_relative(path, workspace_root)));
    }
    for path in &self.documents {
      lines.push(format!("- {} (documentation)", display_relative(path, workspace_root)));
    }
    lines.join("\n")
  }
}

/// Bump every workspace crate to `version`.
///
/// Nothing is written when `dry_run` is set.
pub fn bump_workspace(
  workspace_root: &Path,
  graph: &WorkspaceGraph,
  config: &BumpConfig,
  version: &str,
  dry_run: bool,
) -> LadingResult<BumpOutcome> {
  let version = validate_version(version)?;
  let excluded: BTreeSet<&str> = config.exclude.iter().map(String::as_str).collect();
  let bumped: BTreeSet<String> = graph
    .crate_names()
    .into_iter()
    .filter(|name| !excluded.contains(name))
    .map(str::to_string)
    .collect();

  let mut outcome = BumpOutcome {
    version: version.clone(),
    dry_run,
    manifests: Vec::new(),
    documents: Vec::new(),
  };

  let root_manifest = workspace_root.join("Cargo.toml");
  let root_crate = graph.crates.iter().find(|krate| krate.manifest_path == root_manifest);
  if update_root_manifest(&root_manifest, graph, root_crate, &bumped, &version, dry_run)? {
    outcome.manifests.push(root_manifest.clone());
  }

  for krate in graph.crates.iter().filter(|krate| krate.manifest_path != root_manifest) {
    if update_crate_manifest(graph, krate, &bumped, &version, dry_run)? {
      outcome.manifests.push(krate.manifest_path.clone());
    }
  }

  for path in documentation_files(workspace_root, &config.documentation.globs)? {
    let markdown = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(updated) = documentation::rewrite_toml_fences(&markdown, &bumped, &version) {
      if !dry_run {
        fs::write(&path, updated).with_context(|| format!("Failed to write {}", path.display()))?;
      }
      outcome.documents.push(path);
    }
  }

  log::info!(
    "bump to {}: {} manifest(s), {} document(s){}",
    version,
    outcome.manifests.len(),
    outcome.documents.len(),
    if dry_run { " (dry run)" } else { "" }
  );
  Ok(outcome)
}

fn validate_version(version: &str) -> LadingResult<String> {
  let trimmed = version.trim();
  semver::Version::parse(trimmed).map_err(|err| {
    LadingError::with_help(
      format!("Invalid version '{}': {}", version, err),
      "Versions must follow semantic versioning, e.g. 1.2.3 or 1.0.0-rc.1",
    )
  })?;
  Ok(trimmed.to_string())
}

fn update_root_manifest(
  path: &Path,
  graph: &WorkspaceGraph,
  root_crate: Option<&WorkspaceCrate>,
  bumped: &BTreeSet<String>,
  version: &str,
  dry_run: bool,
) -> LadingResult<bool> {
  if !path.is_file() {
    return Ok(false);
  }
  let mut doc = read_manifest(path)?;

  let mut changed = assign_version(&mut doc, &["workspace", "package"], version);
  changed |= update_workspace_dependency_requirements(&mut doc, bumped, version);
  match root_crate {
    Some(krate) => changed |= apply_crate_changes(&mut doc, graph, krate, bumped, version),
    None => changed |= assign_version(&mut doc, &["package"], version),
  }

  if changed && !dry_run {
    write_manifest(path, &doc)?;
  }
  Ok(changed)
}

fn update_crate_manifest(
  graph: &WorkspaceGraph,
  krate: &WorkspaceCrate,
  bumped: &BTreeSet<String>,
  version: &str,
  dry_run: bool,
) -> LadingResult<bool> {
  let mut doc = read_manifest(&krate.manifest_path)?;
  let changed = apply_crate_changes(&mut doc, graph, krate, bumped, version);
  if changed && !dry_run {
    write_manifest(&krate.manifest_path, &doc)?;
  }
  Ok(changed)
}

fn apply_crate_changes(
  doc: &mut toml_edit::DocumentMut,
  graph: &WorkspaceGraph,
  krate: &WorkspaceCrate,
  bumped: &BTreeSet<String>,
  version: &str,
) -> bool {
  let mut changed = false;
  if bumped.contains(&krate.name) {
    changed |= assign_version(doc, &["package"], version);
  } else {
    log::debug!("{} is excluded from bump; keeping version {}", krate.name, krate.version);
  }

  let manifest_names: BTreeSet<String> = krate
    .dependencies
    .iter()
    .filter(|dep| {
      graph
        .crate_by_id(&dep.package_id)
        .is_some_and(|target| bumped.contains(&target.name))
    })
    .map(|dep| dep.manifest_name.clone())
    .collect();
  if !manifest_names.is_empty() {
    changed |= update_dependency_requirements(doc, &manifest_names, version);
  }
  changed
}

/// Expand documentation globs relative to the workspace root; sorted, without duplicates
fn documentation_files(workspace_root: &Path, globs: &[String]) -> LadingResult<Vec<PathBuf>> {
  let mut files = BTreeSet::new();
  for pattern in globs {
    let absolute = workspace_root.join(pattern);
    let pattern_text = absolute.to_string_lossy();
    for entry in glob::glob(&pattern_text)? {
      let path = entry
        .map_err(|err| LadingError::from(err.into_error()))
        .with_context(|| format!("Failed to expand documentation glob '{}'", pattern))?;
      if path.is_file() {
        files.insert(path);
      }
    }
  }
  Ok(files.into_iter().collect())
}
