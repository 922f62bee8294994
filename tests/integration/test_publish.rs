//! Integration tests for `lading publish`

use crate::helpers::{TestWorkspace, run_lading, run_lading_in, run_lading_raw, stderr, stdout};
use anyhow::Result;

/// common ← app (normal), app ← common (dev), internal unpublished
fn layered_workspace() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.add_crate(
    "common",
    "readme.workspace = true\n\n[dev-dependencies]\napp = { path = \"../app\" }\n",
  )?;
  ws.add_crate(
    "app",
    "\n[dependencies]\ncommon = { path = \"../common\", version = \"0.1.0\" }\n",
  )?;
  ws.add_crate("internal", "publish = false\n")?;
  ws.commit("Add crates")?;
  Ok(ws)
}

#[test]
fn test_publish_plans_stages_and_verifies() -> Result<()> {
  let ws = layered_workspace()?;
  let build = ws.outside("build");
  let build_arg = build.to_string_lossy().to_string();

  let output = run_lading(&ws.path, &["publish", "--build-directory", &build_arg])?;
  let out = stdout(&output);
  let lines: Vec<&str> = out.lines().collect();

  let staged = build.join("workspace");
  assert_eq!(
    lines,
    vec![
      format!("Publish plan for {}", ws.path.display()).as_str(),
      "Strip patch strategy: per-crate",
      "Crates to publish (2):",
      "- common @ 0.1.0",
      "- app @ 0.1.0",
      "Skipped (publish = false):",
      "- internal",
      format!("Staged workspace at: {}", staged.display()).as_str(),
      "Copied workspace README to:",
      "- crates/common/README.md",
    ]
  );

  // Staged clone is complete, the source is untouched
  assert!(staged.join("crates/app/src/lib.rs").is_file());
  assert_eq!(
    std::fs::read_to_string(staged.join("crates/common/README.md"))?,
    "# Test workspace\n"
  );
  assert!(!ws.path.join("crates/common/README.md").exists());
  assert!(build.join("target").is_dir());
  Ok(())
}

#[test]
fn test_publish_rejects_dirty_tree() -> Result<()> {
  let ws = layered_workspace()?;
  std::fs::write(ws.path.join("notes.txt"), "scratch\n")?;
  let build = ws.outside("build");

  let output = run_lading_raw(
    &ws.path,
    &["publish", "--build-directory", &build.to_string_lossy()],
  )?;
  assert_eq!(output.status.code(), Some(3));
  let err = stderr(&output);
  assert!(err.contains("uncommitted changes"), "{}", err);
  assert!(err.contains("notes.txt"), "{}", err);
  assert!(err.contains("--allow-dirty"), "{}", err);
  Ok(())
}

#[test]
fn test_publish_allow_dirty_json_with_cleanup() -> Result<()> {
  let ws = layered_workspace()?;
  ws.write_config("[publish]\nexclude = [\"app\", \"ghost\"]\nstrip_patches = \"all\"\n")?;
  let build = ws.outside("build");

  let output = run_lading(
    &ws.path,
    &[
      "publish",
      "--build-directory",
      &build.to_string_lossy(),
      "--allow-dirty",
      "--cleanup",
      "--json",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_str(&stdout(&output))?;

  assert_eq!(json["publish"].as_array().map(Vec::len), Some(1));
  assert_eq!(json["publish"][0]["name"], "common");
  assert_eq!(json["skipped_configuration"][0], "app");
  assert_eq!(json["missing_configuration_exclusions"][0], "ghost");
  assert_eq!(json["skipped_manifest"][0], "internal");
  assert_eq!(json["strip_patches"], "all");
  assert!(!build.exists(), "build directory should be removed");
  Ok(())
}

#[test]
fn test_publish_order_must_cover_publishable_crates() -> Result<()> {
  let ws = layered_workspace()?;
  ws.write_config("[publish]\norder = [\"app\", \"app\", \"ghost\"]\n")?;

  let output = run_lading_raw(&ws.path, &["publish", "--allow-dirty"])?;
  assert_eq!(output.status.code(), Some(3));
  let err = stderr(&output);
  assert!(err.contains("Duplicate publish.order entries: app"), "{}", err);
  assert!(
    err.contains("publish.order references crates outside the publishable set: ghost"),
    "{}",
    err
  );
  assert!(err.contains("publish.order omits publishable crates: common"), "{}", err);
  Ok(())
}

#[test]
fn test_publish_rejects_build_directory_inside_workspace() -> Result<()> {
  let ws = layered_workspace()?;
  let inside = ws.path.join("staging");

  let output = run_lading_raw(
    &ws.path,
    &["publish", "--build-directory", &inside.to_string_lossy()],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("cannot reside within the workspace root"));
  assert!(!inside.exists());
  Ok(())
}

#[test]
fn test_publish_rejects_build_directory_containing_workspace() -> Result<()> {
  let ws = layered_workspace()?;
  let parent = ws.path.parent().expect("workspace has a parent").to_path_buf();

  for dir in [parent.clone(), parent.join("..")] {
    let output = run_lading_raw(
      &ws.path,
      &["publish", "--build-directory", &dir.to_string_lossy(), "--cleanup"],
    )?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("contains the workspace root"), "{}", stderr(&output));
    assert!(ws.path.join("Cargo.toml").is_file());
    assert!(ws.path.join("crates/app/src/lib.rs").is_file());
  }
  Ok(())
}

#[test]
fn test_relative_build_directory_resolves_against_current_directory() -> Result<()> {
  let ws = layered_workspace()?;
  let cwd = ws.path.parent().expect("workspace has a parent").to_path_buf();

  let output = run_lading_in(&cwd, &ws.path, &["publish", "--build-directory", "relative-build"])?;
  assert!(output.status.success(), "{}", stderr(&output));

  let staged = cwd.join("relative-build").join("workspace");
  assert!(stdout(&output).contains(&format!("Staged workspace at: {}", staged.display())));
  assert!(staged.join("crates/common/Cargo.toml").is_file());
  Ok(())
}

#[test]
fn test_publish_workspace_nested_in_repository() -> Result<()> {
  let ws = TestWorkspace::nested("rust")?;
  ws.add_crate("alpha", "")?;
  ws.commit("Add alpha")?;
  // Changes elsewhere in the repository do not concern this workspace
  let repo = ws.path.parent().expect("workspace has a parent").to_path_buf();
  std::fs::write(repo.join("unrelated.txt"), "scratch\n")?;
  let build = ws.outside("build");

  let output = run_lading(&ws.path, &["publish", "--build-directory", &build.to_string_lossy()])?;
  assert!(stdout(&output).contains("- alpha @ 0.1.0"));
  assert!(build.join("rust/crates/alpha/src/lib.rs").is_file());

  std::fs::write(ws.path.join("crates/alpha/notes.txt"), "scratch\n")?;
  let output = run_lading_raw(&ws.path, &["publish", "--build-directory", &build.to_string_lossy()])?;
  assert_eq!(output.status.code(), Some(3));
  let err = stderr(&output);
  assert!(err.contains("uncommitted changes"), "{}", err);
  assert!(err.contains("rust/crates/alpha/notes.txt"), "{}", err);
  assert!(!err.contains("unrelated.txt"), "{}", err);
  Ok(())
}

#[test]
fn test_missing_config_is_reported() -> Result<()> {
  let ws = layered_workspace()?;
  std::fs::remove_file(ws.path.join("lading.toml"))?;

  let output = run_lading_raw(&ws.path, &["publish"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("No lading configuration found"));
  Ok(())
}

#[test]
fn test_unknown_config_key_is_rejected() -> Result<()> {
  let ws = layered_workspace()?;
  ws.write_config("[publish]\nexclud = [\"app\"]\n")?;

  let output = run_lading_raw(&ws.path, &["publish"])?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("Invalid configuration"), "{}", err);
  assert!(err.contains("exclud"), "{}", err);
  Ok(())
}

#[test]
fn test_missing_workspace_root() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let missing = ws.outside("does-not-exist");

  let output = run_lading_raw(&missing, &["publish"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Workspace root not found"));
  Ok(())
}
