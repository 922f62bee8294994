//! Workspace staging: an isolated copy of the workspace for pre-flight checks
//!
//! ```text
//! <build_directory>/
//!   <workspace dir name>/    staged clone (staging_root)
//!   target/                  cargo target dir used by pre-flight
//! ```
//!
//! All preconditions (build directory placement, README availability) are
//! checked before anything is written. The source workspace is only read.

use crate::core::error::PublishPreparationError;
use crate::graph::workspace_graph::WorkspaceGraph;
use crate::release::plan::PublishPlan;
use crate::utils::{absolutize, canonicalize_existing_prefix, is_within};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const WORKSPACE_README: &str = "README.md";
const TEMP_PREFIX: &str = "lading-publish-";

/// Options controlling staging and pre-flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
  /// Where to stage; a fresh temporary directory when `None`
  pub build_directory: Option<PathBuf>,
  /// Remove the build directory when the preparation is dropped
  pub cleanup: bool,
  /// Copy symlinks as symlinks (true) or as the files they point to (false)
  pub preserve_symlinks: bool,
  /// Skip the clean working tree check
  pub allow_dirty: bool,
}

impl Default for PublishOptions {
  fn default() -> Self {
    Self {
      build_directory: None,
      cleanup: false,
      preserve_symlinks: true,
      allow_dirty: false,
    }
  }
}

/// Result of staging
#[derive(Debug)]
pub struct PublishPreparation {
  /// Directory holding the staged clone and the pre-flight target directory
  pub build_directory: PathBuf,
  /// Root of the staged clone
  pub staging_root: PathBuf,
  /// README copies, sorted by path relative to `staging_root`
  pub copied_readmes: Vec<PathBuf>,
  cleanup: Option<BuildDirectoryGuard>,
}

impl PublishPreparation {
  /// Whether the build directory will be removed on drop
  pub fn cleans_up(&self) -> bool {
    self.cleanup.is_some()
  }
}

/// Removes the build directory when dropped
#[derive(Debug)]
struct BuildDirectoryGuard {
  path: PathBuf,
}

impl Drop for BuildDirectoryGuard {
  fn drop(&mut self) {
    match fs::remove_dir_all(&self.path) {
      Ok(()) => log::debug!("removed build directory {}", self.path.display()),
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
      Err(err) => log::warn!("failed to remove build directory {}: {}", self.path.display(), err),
    }
  }
}

/// Stage `plan`'s workspace into a build directory.
pub fn prepare_workspace(
  plan: &PublishPlan,
  workspace: &WorkspaceGraph,
  options: &PublishOptions,
) -> Result<PublishPreparation, PublishPreparationError> {
  let source_root = plan.workspace_root.as_path();
  let canonical_root = source_root
    .canonicalize()
    .map_err(|e| PublishPreparationError::io("resolve workspace root", source_root, e))?;

  let requested = match &options.build_directory {
    Some(dir) => Some(normalise_build_directory(dir, &canonical_root)?),
    None => None,
  };

  let readme_targets = collect_readme_targets(workspace, source_root)?;
  if let Some(dir) = &requested {
    clone_destination(&canonical_root, dir)?;
  }

  let build_directory = match requested {
    Some(dir) => {
      fs::create_dir_all(&dir).map_err(|e| PublishPreparationError::io("create build directory", &dir, e))?;
      dir
    }
    None => create_temp_build_directory()?,
  };
  log::info!("staging workspace in {}", build_directory.display());

  // A temporary directory is only known once created, so it is checked here
  clone_destination(&canonical_root, &build_directory)?;

  // Registered before copying so a failed copy is still cleaned up
  let cleanup = options.cleanup.then(|| BuildDirectoryGuard {
    path: build_directory.clone(),
  });

  let staging_root = copy_workspace_tree(&canonical_root, &build_directory, options.preserve_symlinks)?;
  let copied_readmes = stage_workspace_readmes(source_root, &staging_root, &readme_targets)?;

  Ok(PublishPreparation {
    build_directory,
    staging_root,
    copied_readmes,
    cleanup,
  })
}

/// Resolve a user-supplied build directory.
///
/// Rejects the workspace root, anything inside it and any ancestor of it, since
/// cleanup removes the whole build directory. Nothing is created; relative
/// paths resolve against the current directory.
pub fn normalise_build_directory(dir: &Path, canonical_root: &Path) -> Result<PathBuf, PublishPreparationError> {
  let absolute = absolutize(dir).map_err(|e| PublishPreparationError::io("resolve build directory", dir, e))?;
  let resolved = canonicalize_existing_prefix(&absolute);
  if is_within(&resolved, canonical_root) || is_within(&absolute, canonical_root) {
    return Err(PublishPreparationError::BuildDirectoryInsideWorkspace {
      build_directory: absolute,
      workspace_root: canonical_root.to_path_buf(),
    });
  }
  if is_within(canonical_root, &resolved) {
    return Err(PublishPreparationError::BuildDirectoryContainsWorkspace {
      build_directory: resolved,
      workspace_root: canonical_root.to_path_buf(),
    });
  }
  Ok(resolved)
}

/// Where the clone of `workspace_root` goes inside `build_directory`.
///
/// Fails when that location is the workspace root or lies inside it.
fn clone_destination(workspace_root: &Path, build_directory: &Path) -> Result<PathBuf, PublishPreparationError> {
  let name = workspace_root.file_name().unwrap_or_else(|| "workspace".as_ref());
  let destination = canonicalize_existing_prefix(build_directory).join(name);
  if is_within(&destination, workspace_root) {
    return Err(PublishPreparationError::CloneInsideWorkspace {
      destination,
      workspace_root: workspace_root.to_path_buf(),
    });
  }
  Ok(destination)
}

fn create_temp_build_directory() -> Result<PathBuf, PublishPreparationError> {
  let temp = tempfile::Builder::new()
    .prefix(TEMP_PREFIX)
    .tempdir()
    .map_err(|e| PublishPreparationError::io("create temporary build directory in", std::env::temp_dir(), e))?;
  // Lifetime is managed by PublishOptions::cleanup, not by TempDir
  Ok(temp.keep())
}

/// Copy the workspace into `build_directory/<workspace dir name>`, replacing any previous clone.
pub fn copy_workspace_tree(
  workspace_root: &Path,
  build_directory: &Path,
  preserve_symlinks: bool,
) -> Result<PathBuf, PublishPreparationError> {
  let destination = clone_destination(workspace_root, build_directory)?;
  remove_existing(&destination)?;
  fs::create_dir_all(&destination).map_err(|e| PublishPreparationError::io("create", &destination, e))?;

  let target_dir = workspace_root.join("target");
  let walker = WalkDir::new(workspace_root)
    .min_depth(1)
    .follow_links(!preserve_symlinks)
    .into_iter()
    .filter_entry(|entry| entry.path() != target_dir);

  let mut copied = 0usize;
  for entry in walker {
    let entry = entry.map_err(|e| {
      let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| workspace_root.to_path_buf());
      PublishPreparationError::io("walk", path, into_io_from_walkdir(e))
    })?;
    let relative = entry
      .path()
      .strip_prefix(workspace_root)
      .map_err(|e| PublishPreparationError::io("relativise", entry.path(), std::io::Error::other(e)))?;
    let dest_path = destination.join(relative);

    if entry.path_is_symlink() && preserve_symlinks {
      copy_symlink(entry.path(), &dest_path)?;
    } else if entry.file_type().is_dir() {
      fs::create_dir_all(&dest_path).map_err(|e| PublishPreparationError::io("create", &dest_path, e))?;
    } else {
      fs::copy(entry.path(), &dest_path).map_err(|e| PublishPreparationError::io("copy", entry.path(), e))?;
      copied += 1;
    }
  }

  log::debug!("copied {} file(s) into {}", copied, destination.display());
  Ok(destination)
}

fn remove_existing(path: &Path) -> Result<(), PublishPreparationError> {
  let Ok(metadata) = fs::symlink_metadata(path) else {
    return Ok(());
  };
  log::debug!("removing previous clone at {}", path.display());
  let result = if metadata.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  };
  result.map_err(|e| PublishPreparationError::io("remove previous clone", path, e))
}

fn copy_symlink(source: &Path, dest: &Path) -> Result<(), PublishPreparationError> {
  let target = fs::read_link(source).map_err(|e| PublishPreparationError::io("read symlink", source, e))?;

  #[cfg(unix)]
  let result = std::os::unix::fs::symlink(&target, dest);

  #[cfg(windows)]
  let result = if source.is_dir() {
    std::os::windows::fs::symlink_dir(&target, dest)
  } else {
    std::os::windows::fs::symlink_file(&target, dest)
  };

  result.map_err(|e| PublishPreparationError::io("create symlink", dest, e))
}

/// Crate directories (relative to the workspace root) that need the workspace README.
///
/// Considers every crate in the workspace, publishable or not, and sorts the result.
pub fn collect_readme_targets(
  workspace: &WorkspaceGraph,
  workspace_root: &Path,
) -> Result<Vec<PathBuf>, PublishPreparationError> {
  let mut opted_in: Vec<_> = workspace.crates.iter().filter(|krate| krate.readme_is_workspace).collect();
  if opted_in.is_empty() {
    return Ok(Vec::new());
  }
  opted_in.sort_by(|a, b| a.name.cmp(&b.name));

  let readme = workspace_root.join(WORKSPACE_README);
  if !readme.is_file() {
    return Err(PublishPreparationError::MissingWorkspaceReadme {
      readme,
      crates: opted_in.iter().map(|krate| krate.name.clone()).collect(),
    });
  }

  let mut targets = Vec::with_capacity(opted_in.len());
  for krate in opted_in {
    let relative = krate.root_path.strip_prefix(workspace_root).map_err(|_| {
      PublishPreparationError::CrateOutsideWorkspace {
        crate_name: krate.name.clone(),
        root_path: krate.root_path.clone(),
        workspace_root: workspace_root.to_path_buf(),
      }
    })?;
    targets.push(relative.to_path_buf());
  }
  targets.sort();
  targets.dedup();
  Ok(targets)
}

/// Copy the workspace README into each staged crate directory in `targets`.
pub fn stage_workspace_readmes(
  workspace_root: &Path,
  staging_root: &Path,
  targets: &[PathBuf],
) -> Result<Vec<PathBuf>, PublishPreparationError> {
  let readme = workspace_root.join(WORKSPACE_README);
  let mut copied = Vec::with_capacity(targets.len());
  for relative in targets {
    let crate_dir = staging_root.join(relative);
    fs::create_dir_all(&crate_dir).map_err(|e| PublishPreparationError::io("create", &crate_dir, e))?;
    let dest = crate_dir.join(WORKSPACE_README);
    // Replace symlinked READMEs rather than writing through them
    if fs::symlink_metadata(&dest).is_ok_and(|m| m.file_type().is_symlink()) {
      fs::remove_file(&dest).map_err(|e| PublishPreparationError::io("remove", &dest, e))?;
    }
    fs::copy(&readme, &dest).map_err(|e| PublishPreparationError::io("copy", &readme, e))?;
    log::debug!("copied workspace README to {}", dest.display());
    copied.push(dest);
  }
  Ok(copied)
}

fn into_io_from_walkdir(err: walkdir::Error) -> std::io::Error {
  if err.io_error().is_some() {
    std::io::Error::from(err)
  } else {
    // Symlink loops carry no io::Error
    std::io::Error::other(err.to_string())
  }
}
