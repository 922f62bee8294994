//! Utility functions for cross-platform path handling

use crate::core::error::{LadingResult, WorkspaceModelError};
use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied workspace root to an absolute, canonical path.
///
/// Fails with `WorkspaceModelError::RootNotFound` when the directory does not exist.
pub fn normalise_workspace_root(path: &Path) -> LadingResult<PathBuf> {
  let absolute = absolutize(path)?;
  if !absolute.is_dir() {
    return Err(WorkspaceModelError::RootNotFound { path: absolute }.into());
  }
  Ok(absolute.canonicalize()?)
}

/// Make a path absolute against the current directory and remove `.`/`..` lexically.
///
/// Does not touch the filesystem beyond reading the current directory, so it
/// works for paths that do not exist yet.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    std::env::current_dir()?.join(path)
  };
  Ok(normalize_lexically(&joined))
}

/// Remove `.` and `..` components without resolving symlinks
pub fn normalize_lexically(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        // Popping past the root is a no-op, matching how the OS resolves `/..`
        if !matches!(out.components().next_back(), Some(Component::RootDir | Component::Prefix(_)) | None) {
          out.pop();
        }
      }
      other => out.push(other.as_os_str()),
    }
  }
  out
}

/// Resolve the longest existing ancestor of `path` through the filesystem and
/// re-append the remaining components.
///
/// Lets a not-yet-created directory be compared against a canonical root even
/// when part of its prefix is a symlink (e.g. `/tmp` on macOS).
pub fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
  let mut existing = path.to_path_buf();
  let mut remainder = Vec::new();
  while !existing.exists() {
    match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
      (Some(name), Some(parent)) => {
        remainder.push(name);
        existing = parent.to_path_buf();
      }
      _ => return path.to_path_buf(),
    }
  }

  let mut resolved = existing.canonicalize().unwrap_or(existing);
  for name in remainder.into_iter().rev() {
    resolved.push(name);
  }
  resolved
}

/// True when `path` equals `root` or lies beneath it (component-wise)
pub fn is_within(path: &Path, root: &Path) -> bool {
  path.starts_with(root)
}

/// Display `path` relative to `base` when it lies beneath it, otherwise as-is.
///
/// Always uses forward slashes so output is stable across platforms.
pub fn display_relative(path: &Path, base: &Path) -> String {
  match path.strip_prefix(base) {
    Ok(relative) => path_to_forward_slashes(relative),
    Err(_) => path_to_forward_slashes(path),
  }
}

/// Convert a path to forward-slash form
pub fn path_to_forward_slashes(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
