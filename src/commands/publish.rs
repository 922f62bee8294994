//! `lading publish` command
//!
//! plan → stage → pre-flight → report. No crate is uploaded.

use crate::core::context::WorkspaceContext;
use crate::core::error::LadingResult;
use crate::release::plan::{PublishPolicy, plan_publication};
use crate::release::preflight::{CommandRunner, SystemRunner, run_preflight_checks};
use crate::release::report::{PublishSummary, format_publish_report};
use crate::release::staging::{PublishOptions, prepare_workspace};

/// Run the publish pipeline with the system git and cargo
pub fn run_publish(ctx: &WorkspaceContext, options: &PublishOptions, json: bool) -> LadingResult<()> {
  let output = publish_with_runner(ctx, options, json, &SystemRunner)?;
  print!("{}", output);
  Ok(())
}

/// Plan, stage and verify; returns the report text.
///
/// The staged build directory is removed before returning when `options.cleanup` is set.
pub fn publish_with_runner(
  ctx: &WorkspaceContext,
  options: &PublishOptions,
  json: bool,
  runner: &dyn CommandRunner,
) -> LadingResult<String> {
  let publish_config = &ctx.config.publish;
  let policy = PublishPolicy::from_config(publish_config);
  let plan = plan_publication(&ctx.graph, &policy)?;
  log::info!("publish order: {}", plan.publishable_names().join(", "));

  let preparation = prepare_workspace(&plan, &ctx.graph, options)?;
  let target_dir = preparation.build_directory.join("target");
  run_preflight_checks(&ctx.root, &preparation.staging_root, &target_dir, options, runner)?;

  let strategy = publish_config.strip_patches;
  if json {
    let summary = PublishSummary::new(&plan, &preparation, strategy);
    Ok(format!("{}\n", serde_json::to_string_pretty(&summary)?))
  } else {
    Ok(format_publish_report(&plan, &preparation, strategy))
  }
}
