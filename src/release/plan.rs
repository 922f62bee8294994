//! Publish planning: which crates to publish, which to skip, and in what order
//!
//! `plan_publication` is a pure function of the workspace model and the
//! `[publish]` policy. It never touches the filesystem and either returns a
//! complete plan or a `PublishPlanError` listing every problem it found.

use crate::core::config::PublishConfig;
use crate::core::error::{PlanIssue, PublishPlanError};
use crate::graph::workspace_graph::{WorkspaceCrate, WorkspaceGraph, dependency_order};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

/// User-supplied publication policy (`[publish]` in lading.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishPolicy {
  /// Crate names to skip even though their manifest allows publishing
  pub exclude: BTreeSet<String>,
  /// Explicit publish order; empty means "derive from dependencies"
  pub order: Vec<String>,
}

impl PublishPolicy {
  pub fn from_config(config: &PublishConfig) -> Self {
    Self {
      exclude: config.exclude.iter().cloned().collect(),
      order: config.order.clone(),
    }
  }
}

/// Outcome of planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
  pub workspace_root: PathBuf,
  /// Crates to publish, in publication order
  pub publishable: Vec<WorkspaceCrate>,
  /// Crates whose manifest sets `publish = false`, sorted by name
  pub skipped_manifest: Vec<WorkspaceCrate>,
  /// Crates excluded via `publish.exclude`, sorted by name
  pub skipped_configuration: Vec<WorkspaceCrate>,
  /// `publish.exclude` entries that match no workspace crate, sorted
  pub missing_configuration_exclusions: Vec<String>,
}

impl PublishPlan {
  pub fn publishable_names(&self) -> Vec<&str> {
    self.publishable.iter().map(|krate| krate.name.as_str()).collect()
  }
}

/// Build a publish plan for `workspace` under `policy`.
pub fn plan_publication(workspace: &WorkspaceGraph, policy: &PublishPolicy) -> Result<PublishPlan, PublishPlanError> {
  let mut candidates: Vec<&WorkspaceCrate> = Vec::new();
  let mut skipped_manifest: Vec<WorkspaceCrate> = Vec::new();
  let mut skipped_configuration: Vec<WorkspaceCrate> = Vec::new();

  for krate in &workspace.crates {
    if !krate.publish {
      skipped_manifest.push(krate.clone());
    } else if policy.exclude.contains(&krate.name) {
      skipped_configuration.push(krate.clone());
    } else {
      candidates.push(krate);
    }
  }

  let members = workspace.crate_names();
  let missing_configuration_exclusions: Vec<String> = policy
    .exclude
    .iter()
    .filter(|name| !members.contains(name.as_str()))
    .cloned()
    .collect();

  let ordered = if policy.order.is_empty() {
    order_by_dependencies(&candidates)?
  } else {
    order_by_configuration(&candidates, &policy.order)?
  };

  skipped_manifest.sort_by(|a, b| a.name.cmp(&b.name));
  skipped_configuration.sort_by(|a, b| a.name.cmp(&b.name));

  log::debug!(
    "planned {} crate(s) to publish, {} skipped by manifest, {} skipped by configuration",
    ordered.len(),
    skipped_manifest.len(),
    skipped_configuration.len()
  );

  Ok(PublishPlan {
    workspace_root: workspace.workspace_root().to_path_buf(),
    publishable: ordered.into_iter().cloned().collect(),
    skipped_manifest,
    skipped_configuration,
    missing_configuration_exclusions,
  })
}

fn order_by_dependencies<'a>(candidates: &[&'a WorkspaceCrate]) -> Result<Vec<&'a WorkspaceCrate>, PublishPlanError> {
  dependency_order(candidates).map_err(|residual| PublishPlanError {
    issues: vec![PlanIssue::Cycle(residual)],
  })
}

/// Validate `order` against the candidate set and return it mapped to crates.
fn order_by_configuration<'a>(
  candidates: &[&'a WorkspaceCrate],
  order: &[String],
) -> Result<Vec<&'a WorkspaceCrate>, PublishPlanError> {
  let by_name: HashMap<&str, &'a WorkspaceCrate> =
    candidates.iter().map(|krate| (krate.name.as_str(), *krate)).collect();

  let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
  for name in order {
    *counts.entry(name.as_str()).or_default() += 1;
  }

  let duplicates: Vec<String> = counts
    .iter()
    .filter(|(_, count)| **count > 1)
    .map(|(name, _)| name.to_string())
    .collect();
  let unknown: Vec<String> = counts
    .keys()
    .filter(|name| !by_name.contains_key(*name))
    .map(|name| name.to_string())
    .collect();
  let mut omitted: Vec<String> = candidates
    .iter()
    .filter(|krate| !counts.contains_key(krate.name.as_str()))
    .map(|krate| krate.name.clone())
    .collect();
  omitted.sort();

  let mut issues = Vec::new();
  if !duplicates.is_empty() {
    issues.push(PlanIssue::DuplicateOrder(duplicates));
  }
  if !unknown.is_empty() {
    issues.push(PlanIssue::UnknownInOrder(unknown));
  }
  if !omitted.is_empty() {
    issues.push(PlanIssue::OmittedFromOrder(omitted));
  }
  if !issues.is_empty() {
    return Err(PublishPlanError { issues });
  }

  Ok(order.iter().filter_map(|name| by_name.get(name.as_str()).copied()).collect())
}
