//! `lading bump` command

use crate::bump::bump_workspace;
use crate::core::context::WorkspaceContext;
use crate::core::error::LadingResult;

/// Bump every workspace crate to `version` and print the changed files
pub fn run_bump(ctx: &WorkspaceContext, version: &str, dry_run: bool) -> LadingResult<()> {
  let outcome = bump_workspace(ctx.workspace_root(), &ctx.graph, &ctx.config.bump, version, dry_run)?;
  println!("{}", outcome.message(ctx.workspace_root()));
  Ok(())
}
