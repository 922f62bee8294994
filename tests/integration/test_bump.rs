//! Integration tests for `lading bump`

use crate::helpers::{TestWorkspace, run_lading, run_lading_raw, stderr, stdout};
use anyhow::Result;

fn two_crate_workspace() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("common", "")?;
  ws.add_crate(
    "app",
    "\n[dependencies]\ncommon = { path = \"../common\", version = \"^0.1.0\" } # keep in sync\n",
  )?;
  ws.commit("Add crates")?;
  Ok(ws)
}

#[test]
fn test_bump_rewrites_manifests() -> Result<()> {
  let ws = two_crate_workspace()?;

  let output = run_lading(&ws.path, &["bump", "1.2.3"])?;
  assert_eq!(
    stdout(&output).trim_end(),
    "Updated version to 1.2.3 in 3 manifest(s):\n- Cargo.toml\n- crates/app/Cargo.toml\n- crates/common/Cargo.toml"
  );

  assert!(ws.read_file("Cargo.toml")?.contains("version = \"1.2.3\""));
  assert!(ws.read_file("crates/common/Cargo.toml")?.contains("version = \"1.2.3\""));
  let app = ws.read_file("crates/app/Cargo.toml")?;
  assert!(
    app.contains("common = { path = \"../common\", version = \"^1.2.3\" } # keep in sync"),
    "{}",
    app
  );
  Ok(())
}

#[test]
fn test_bump_dry_run_leaves_files_alone() -> Result<()> {
  let ws = two_crate_workspace()?;
  let before = ws.read_file("crates/app/Cargo.toml")?;

  let output = run_lading(&ws.path, &["bump", "2.0.0", "--dry-run"])?;
  assert!(stdout(&output).starts_with("Dry run; would update version to 2.0.0 in 3 manifest(s):"));
  assert_eq!(ws.read_file("crates/app/Cargo.toml")?, before);
  Ok(())
}

#[test]
fn test_bump_exclude_and_documentation() -> Result<()> {
  let ws = two_crate_workspace()?;
  ws.write_config("[bump]\nexclude = \"app\"\n\n[bump.documentation]\nglobs = [\"README.md\"]\n")?;
  std::fs::write(
    ws.path.join("README.md"),
    "# Test workspace\n\n```toml\n[dependencies]\ncommon = \"0.1.0\"\n```\n",
  )?;

  let output = run_lading(&ws.path, &["bump", "0.2.0"])?;
  let out = stdout(&output);
  assert!(out.contains("- README.md (documentation)"), "{}", out);

  let app = ws.read_file("crates/app/Cargo.toml")?;
  assert!(app.contains("version = \"0.1.0\"\n"), "{}", app);
  assert!(app.contains("version = \"^0.2.0\""), "{}", app);
  assert!(ws.read_file("README.md")?.contains("common = \"0.2.0\""));
  Ok(())
}

#[test]
fn test_bump_is_idempotent() -> Result<()> {
  let ws = two_crate_workspace()?;
  run_lading(&ws.path, &["bump", "0.3.0"])?;

  let output = run_lading(&ws.path, &["bump", "0.3.0"])?;
  assert_eq!(
    stdout(&output).trim_end(),
    "No manifest changes required; all versions already 0.3.0."
  );
  Ok(())
}

#[test]
fn test_bump_rejects_invalid_version() -> Result<()> {
  let ws = two_crate_workspace()?;

  let output = run_lading_raw(&ws.path, &["bump", "one.two"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Invalid version 'one.two'"));
  Ok(())
}
