//! Human-readable and JSON summaries of a publish run

use crate::core::config::StripPatchStrategy;
use crate::release::plan::PublishPlan;
use crate::release::staging::PublishPreparation;
use crate::utils::{display_relative, path_to_forward_slashes};
use serde::Serialize;
use std::path::PathBuf;

/// Render the plan and staging summary printed by `lading publish`.
pub fn format_publish_report(
  plan: &PublishPlan,
  preparation: &PublishPreparation,
  strip_patches: StripPatchStrategy,
) -> String {
  let mut lines = format_plan(plan, strip_patches);
  lines.push(format!(
    "Staged workspace at: {}",
    path_to_forward_slashes(&preparation.staging_root)
  ));

  if preparation.copied_readmes.is_empty() {
    lines.push("Copied workspace README to: none required".to_string());
  } else {
    lines.push("Copied workspace README to:".to_string());
    for readme in &preparation.copied_readmes {
      lines.push(format!("- {}", display_relative(readme, &preparation.staging_root)));
    }
  }

  let mut out = lines.join("\n");
  out.push('\n');
  out
}

/// Plan lines only, without staging details
pub fn format_plan(plan: &PublishPlan, strip_patches: StripPatchStrategy) -> Vec<String> {
  let mut lines = vec![
    format!("Publish plan for {}", path_to_forward_slashes(&plan.workspace_root)),
    format!("Strip patch strategy: {}", strip_patches),
  ];

  if plan.publishable.is_empty() {
    lines.push("Crates to publish: none".to_string());
  } else {
    lines.push(format!("Crates to publish ({}):", plan.publishable.len()));
    lines.extend(
      plan
        .publishable
        .iter()
        .map(|krate| format!("- {} @ {}", krate.name, krate.version)),
    );
  }

  if !plan.skipped_manifest.is_empty() {
    lines.push("Skipped (publish = false):".to_string());
    lines.extend(plan.skipped_manifest.iter().map(|krate| format!("- {}", krate.name)));
  }

  if !plan.skipped_configuration.is_empty() {
    lines.push("Skipped via publish.exclude:".to_string());
    lines.extend(
      plan
        .skipped_configuration
        .iter()
        .map(|krate| format!("- {}", krate.name)),
    );
  }

  if !plan.missing_configuration_exclusions.is_empty() {
    lines.push("Configured exclusions not found in workspace:".to_string());
    lines.extend(
      plan
        .missing_configuration_exclusions
        .iter()
        .map(|name| format!("- {}", name)),
    );
  }

  lines
}

/// Machine-readable form of a publish run (`--json`)
#[derive(Debug, Serialize)]
pub struct PublishSummary {
  pub workspace_root: PathBuf,
  pub strip_patches: String,
  pub publish: Vec<CrateSummary>,
  pub skipped_manifest: Vec<String>,
  pub skipped_configuration: Vec<String>,
  pub missing_configuration_exclusions: Vec<String>,
  pub staging_root: PathBuf,
  pub build_directory: PathBuf,
  pub copied_readmes: Vec<PathBuf>,
  pub cleanup: bool,
}

#[derive(Debug, Serialize)]
pub struct CrateSummary {
  pub name: String,
  pub version: String,
  pub manifest_path: PathBuf,
}

impl PublishSummary {
  pub fn new(plan: &PublishPlan, preparation: &PublishPreparation, strip_patches: StripPatchStrategy) -> Self {
    Self {
      workspace_root: plan.workspace_root.clone(),
      strip_patches: strip_patches.to_string(),
      publish: plan
        .publishable
        .iter()
        .map(|krate| CrateSummary {
          name: krate.name.clone(),
          version: krate.version.clone(),
          manifest_path: krate.manifest_path.clone(),
        })
        .collect(),
      skipped_manifest: plan.skipped_manifest.iter().map(|k| k.name.clone()).collect(),
      skipped_configuration: plan.skipped_configuration.iter().map(|k| k.name.clone()).collect(),
      missing_configuration_exclusions: plan.missing_configuration_exclusions.clone(),
      staging_root: preparation.staging_root.clone(),
      build_directory: preparation.build_directory.clone(),
      copied_readmes: preparation.copied_readmes.clone(),
      cleanup: preparation.cleans_up(),
    }
  }
}
