//! Pre-flight verification of a staged workspace
//!
//! Checks run in order and stop at the first failure:
//!
//! 1. clean working tree (`git status --porcelain -- .`), unless `allow_dirty`
//! 2. `cargo check --workspace --all-targets`
//! 3. `cargo test --workspace --all-targets`
//!
//! The git check looks at the source workspace, restricted to its directory,
//! so a workspace nested inside a larger repository is judged by its own
//! files. Staging only reads the source, so this is the state the clone was
//! made from. The cargo steps build the staged clone.
//!
//! External processes go through the `CommandRunner` trait so tests can
//! script their results without spawning anything.

use crate::core::error::PublishPreflightError;
use crate::release::staging::PublishOptions;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Exit code; `None` when terminated by a signal
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.status == Some(0)
  }
}

/// Runs external commands to completion
pub trait CommandRunner {
  fn run(&self, program: &str, args: &[String], cwd: &Path) -> std::io::Result<CommandOutput>;
}

/// Runs commands with `std::process::Command`, blocking until they exit
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, program: &str, args: &[String], cwd: &Path) -> std::io::Result<CommandOutput> {
    log::debug!("running {} {} in {}", program, args.join(" "), cwd.display());
    let output = Command::new(program).args(args).current_dir(cwd).output()?;
    Ok(CommandOutput {
      status: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
  }
}

/// Everything a pre-flight check needs
pub struct PreflightContext<'a> {
  /// Workspace the clone was staged from
  pub source_root: &'a Path,
  /// Root of the staged clone being built
  pub root: &'a Path,
  /// Cargo target directory, kept outside `root`
  pub target_dir: PathBuf,
  pub runner: &'a dyn CommandRunner,
}

/// One pre-flight step
pub trait PreflightCheck {
  /// Short name used in logs
  fn name(&self) -> &str;

  fn run(&self, ctx: &PreflightContext<'_>) -> Result<(), PublishPreflightError>;
}

/// Fails when git reports uncommitted changes under the source workspace
#[derive(Debug, Default)]
pub struct CleanWorkingTree;

impl PreflightCheck for CleanWorkingTree {
  fn name(&self) -> &str {
    "clean-working-tree"
  }

  fn run(&self, ctx: &PreflightContext<'_>) -> Result<(), PublishPreflightError> {
    let args = ["status", "--porcelain", "--", "."].map(String::from);
    let output = run_command(ctx, "git", &args, ctx.source_root)?;
    if !output.success() {
      return Err(PublishPreflightError::NotARepository {
        root: ctx.source_root.to_path_buf(),
        stderr: output.stderr,
      });
    }

    let changes: Vec<String> = output
      .stdout
      .lines()
      .filter(|line| !line.trim().is_empty())
      .map(str::to_string)
      .collect();
    if !changes.is_empty() {
      return Err(PublishPreflightError::DirtyWorkingTree {
        root: ctx.source_root.to_path_buf(),
        changes,
      });
    }
    Ok(())
  }
}

/// `cargo <subcommand> --workspace --all-targets --target-dir=<dir>`
pub struct CargoWorkspaceCommand {
  subcommand: &'static str,
}

impl CargoWorkspaceCommand {
  pub fn check() -> Self {
    Self { subcommand: "check" }
  }

  pub fn test() -> Self {
    Self { subcommand: "test" }
  }

  fn args(&self, target_dir: &Path) -> Vec<String> {
    vec![
      self.subcommand.to_string(),
      "--workspace".to_string(),
      "--all-targets".to_string(),
      format!("--target-dir={}", target_dir.display()),
    ]
  }
}

impl PreflightCheck for CargoWorkspaceCommand {
  fn name(&self) -> &str {
    self.subcommand
  }

  fn run(&self, ctx: &PreflightContext<'_>) -> Result<(), PublishPreflightError> {
    let args = self.args(&ctx.target_dir);
    let output = run_command(ctx, "cargo", &args, ctx.root)?;
    if output.success() {
      return Ok(());
    }

    Err(PublishPreflightError::CommandFailed {
      command: format!("cargo {}", args.join(" ")),
      exit_code: output.status,
      output: combined_output(&output),
    })
  }
}

/// stderr followed by stdout, skipping empty streams
fn combined_output(output: &CommandOutput) -> String {
  [output.stderr.trim_end(), output.stdout.trim_end()]
    .into_iter()
    .filter(|stream| !stream.trim().is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}

fn run_command(
  ctx: &PreflightContext<'_>,
  program: &str,
  args: &[String],
  cwd: &Path,
) -> Result<CommandOutput, PublishPreflightError> {
  ctx
    .runner
    .run(program, args, cwd)
    .map_err(|source| PublishPreflightError::Spawn {
      command: format!("{} {}", program, args.join(" ")),
      source,
    })
}

/// The checks to run for `options`, in order
pub fn preflight_checks(options: &PublishOptions) -> Vec<Box<dyn PreflightCheck>> {
  let mut checks: Vec<Box<dyn PreflightCheck>> = Vec::new();
  if !options.allow_dirty {
    checks.push(Box::new(CleanWorkingTree));
  }
  checks.push(Box::new(CargoWorkspaceCommand::check()));
  checks.push(Box::new(CargoWorkspaceCommand::test()));
  checks
}

/// Verify the clone at `root` staged from `source_root`, building into `target_dir`.
pub fn run_preflight_checks(
  source_root: &Path,
  root: &Path,
  target_dir: &Path,
  options: &PublishOptions,
  runner: &dyn CommandRunner,
) -> Result<(), PublishPreflightError> {
  let ctx = PreflightContext {
    source_root,
    root,
    target_dir: target_dir.to_path_buf(),
    runner,
  };

  for check in preflight_checks(options) {
    log::info!("pre-flight: {}", check.name());
    check.run(&ctx)?;
  }
  Ok(())
}
