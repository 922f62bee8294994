//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A committed Cargo workspace with a lading.toml
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create an empty workspace (root manifest, lading.toml, .gitignore) with one commit
  pub fn new() -> Result<Self> {
    Self::in_repository("workspace", "")
  }

  /// Workspace at `repo/<subdir>` inside a larger git repository
  pub fn nested(subdir: &str) -> Result<Self> {
    Self::in_repository("repo", subdir)
  }

  fn in_repository(repo: &str, subdir: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let repo = root.path().join(repo);
    let path = repo.join(subdir);
    std::fs::create_dir_all(&path)?;
    let path = path.canonicalize()?;

    git(&repo, &["init", "--initial-branch=main"])?;
    git(&repo, &["config", "user.name", "Test User"])?;
    git(&repo, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      path.join("Cargo.toml"),
      r#"[workspace]
members = ["crates/*"]
resolver = "2"

[workspace.package]
version = "0.1.0"
edition = "2021"
license = "MIT"
readme = "README.md"
"#,
    )?;
    std::fs::write(path.join("lading.toml"), "")?;
    std::fs::write(path.join(".gitignore"), "target/\nCargo.lock\n")?;
    std::fs::write(path.join("README.md"), "# Test workspace\n")?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial workspace setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a library crate; `extra` is appended to its manifest verbatim
  pub fn add_crate(&self, name: &str, extra: &str) -> Result<PathBuf> {
    let crate_path = self.path.join("crates").join(name);
    std::fs::create_dir_all(crate_path.join("src"))?;

    let cargo_toml = format!(
      r#"[package]
name = "{}"
version = "0.1.0"
edition.workspace = true
license.workspace = true
{}"#,
      name, extra
    );
    std::fs::write(crate_path.join("Cargo.toml"), cargo_toml)?;

    std::fs::write(
      crate_path.join("src/lib.rs"),
      format!(
        r#"//! {} crate

pub fn hello() -> &'static str {{
    "Hello from {}"
}}

#[cfg(test)]
mod tests {{
    use super::*;

    #[test]
    fn test_hello() {{
        assert_eq!(hello(), "Hello from {}");
    }}
}}
"#,
        name, name, name
      ),
    )?;

    Ok(crate_path)
  }

  /// Replace lading.toml
  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("lading.toml"), content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<()> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    Ok(())
  }

  /// Read a file relative to the workspace root
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// A sibling directory of the workspace, for build directories
  pub fn outside(&self, name: &str) -> PathBuf {
    self.path.with_file_name(name)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run lading against `workspace`, whatever its exit status
pub fn run_lading_raw(workspace: &Path, args: &[&str]) -> Result<Output> {
  let lading_bin = env!("CARGO_BIN_EXE_lading");

  Command::new(lading_bin)
    .arg("--workspace-root")
    .arg(workspace)
    .args(args)
    .env_remove("LADING_WORKSPACE_ROOT")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run lading")
}

/// Run lading from `cwd` against `workspace`, whatever its exit status
pub fn run_lading_in(cwd: &Path, workspace: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_lading"))
    .current_dir(cwd)
    .arg("--workspace-root")
    .arg(workspace)
    .args(args)
    .env_remove("LADING_WORKSPACE_ROOT")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run lading")
}

/// Run lading and fail unless it succeeds
pub fn run_lading(workspace: &Path, args: &[&str]) -> Result<Output> {
  let output = run_lading_raw(workspace, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "lading command failed: lading {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// stdout as a string
pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

/// stderr as a string
pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}
