//! Format-preserving Cargo.toml edits
//!
//! All rewrites go through `toml_edit` so comments, ordering, whitespace and
//! quote style survive. Functions report whether they changed anything; the
//! caller decides whether to write the document back.

use crate::core::error::{LadingResult, ResultExt};
use std::collections::BTreeSet;
use std::path::Path;
use toml_edit::{DocumentMut, Item, TableLike, Value};

/// Dependency tables that may reference other workspace crates
pub const DEPENDENCY_SECTIONS: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Read and parse a manifest
pub fn read_manifest(path: &Path) -> LadingResult<DocumentMut> {
  let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  content
    .parse::<DocumentMut>()
    .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a manifest back to disk
pub fn write_manifest(path: &Path, doc: &DocumentMut) -> LadingResult<()> {
  std::fs::write(path, doc.to_string()).with_context(|| format!("Failed to write {}", path.display()))
}

/// Whether `[package]` sets `readme.workspace = true` (dotted or inline form)
pub fn readme_is_workspace(doc: &DocumentMut) -> bool {
  doc
    .get("package")
    .and_then(|package| package.get("readme"))
    .and_then(|readme| readme.get("workspace"))
    .and_then(Item::as_bool)
    .unwrap_or(false)
}

/// Set `version` in the table at `table_path` (e.g. `["workspace", "package"]`).
///
/// Missing tables and inherited versions (`version.workspace = true`) are left alone.
pub fn assign_version(doc: &mut DocumentMut, table_path: &[&str], version: &str) -> bool {
  let mut item = doc.as_item_mut();
  for key in table_path {
    match item.get_mut(key) {
      Some(next) => item = next,
      None => return false,
    }
  }

  let Some(table) = item.as_table_like_mut() else {
    return false;
  };
  match table.get_mut("version").and_then(|v| v.as_value_mut()) {
    Some(value) => set_string_preserving_format(value, version),
    None => false,
  }
}

/// Rewrite the version requirement of every dependency keyed by one of `manifest_names`.
///
/// Covers `[dependencies]`, `[dev-dependencies]`, `[build-dependencies]` and
/// their `[target.'cfg(..)'.*]` counterparts.
pub fn update_dependency_requirements(doc: &mut DocumentMut, manifest_names: &BTreeSet<String>, version: &str) -> bool {
  let mut changed = false;
  for section in DEPENDENCY_SECTIONS {
    if let Some(table) = doc.get_mut(section).and_then(|item| item.as_table_like_mut()) {
      changed |= update_dependency_table(table, manifest_names, version);
    }
  }

  if let Some(targets) = doc.get_mut("target").and_then(|item| item.as_table_like_mut()) {
    for (_, target) in targets.iter_mut() {
      let Some(target) = target.as_table_like_mut() else {
        continue;
      };
      for section in DEPENDENCY_SECTIONS {
        if let Some(table) = target.get_mut(section).and_then(|item| item.as_table_like_mut()) {
          changed |= update_dependency_table(table, manifest_names, version);
        }
      }
    }
  }

  changed
}

/// Rewrite `[workspace.dependencies]` entries that point at workspace crates.
///
/// Entries match on their key or, for renamed entries, on `package = "..."`.
pub fn update_workspace_dependency_requirements(
  doc: &mut DocumentMut,
  crate_names: &BTreeSet<String>,
  version: &str,
) -> bool {
  let Some(table) = doc
    .get_mut("workspace")
    .and_then(|workspace| workspace.get_mut("dependencies"))
    .and_then(|item| item.as_table_like_mut())
  else {
    return false;
  };

  let mut changed = false;
  for (key, item) in table.iter_mut() {
    let package = item.get("package").and_then(Item::as_str).map(str::to_string);
    let target = package.unwrap_or_else(|| key.get().to_string());
    if crate_names.contains(&target) {
      changed |= update_dependency_entry(item, version);
    }
  }
  changed
}

fn update_dependency_table(table: &mut dyn TableLike, manifest_names: &BTreeSet<String>, version: &str) -> bool {
  let mut changed = false;
  for (key, item) in table.iter_mut() {
    if manifest_names.contains(key.get()) {
      changed |= update_dependency_entry(item, version);
    }
  }
  changed
}

/// Update a single dependency entry: `dep = "1.0"`, `dep = { version = "1.0" }` or `[dependencies.dep]`
pub fn update_dependency_entry(item: &mut Item, version: &str) -> bool {
  if item.is_str() {
    return item
      .as_value_mut()
      .is_some_and(|value| update_requirement_value(value, version));
  }

  let Some(table) = item.as_table_like_mut() else {
    return false;
  };
  // `{ workspace = true }` inherits the requirement; never add one
  if table.contains_key("workspace") {
    return false;
  }
  match table.get_mut("version").and_then(|v| v.as_value_mut()) {
    Some(value) => update_requirement_value(value, version),
    None => false,
  }
}

fn update_requirement_value(value: &mut Value, version: &str) -> bool {
  let Some(current) = value.as_str() else {
    return false;
  };
  let Some(updated) = replace_requirement_version(current, version) else {
    log::debug!("leaving version requirement '{}' untouched", current);
    return false;
  };
  set_string_preserving_format(value, &updated)
}

/// Swap the version in a single-comparator requirement, keeping its operator.
///
/// `^0.1` → `^1.2.3`, `~0.1.0` → `~1.2.3`, `0.1` → `1.2.3`. Compound (`>=1, <2`)
/// and wildcard requirements return `None`, as do `<`, `<=` and `>`, which
/// would exclude the version they name.
pub fn replace_requirement_version(requirement: &str, version: &str) -> Option<String> {
  let trimmed = requirement.trim();
  let body_start = trimmed
    .find(|c: char| !matches!(c, '^' | '~' | '=' | '<' | '>') && !c.is_whitespace())
    .unwrap_or(trimmed.len());
  let (operator, body) = trimmed.split_at(body_start);
  if body.is_empty() || body.contains(',') || body.contains('*') {
    return None;
  }
  let op = operator.trim();
  if op.starts_with('<') || op == ">" {
    return None;
  }
  Some(format!("{}{}", operator, version))
}

/// Replace a string value, keeping its decor (comments, spacing) and quote style.
///
/// Returns false when the value is not a string or already equals `text`.
pub fn set_string_preserving_format(value: &mut Value, text: &str) -> bool {
  let Some(current) = value.as_str() else {
    return false;
  };
  if current == text {
    return false;
  }

  let literal_quotes = match value {
    Value::String(formatted) => formatted
      .as_repr()
      .and_then(|repr| repr.as_raw().as_str())
      .is_some_and(|raw| raw.starts_with('\'')),
    _ => false,
  };

  let mut replacement = if literal_quotes && !text.contains('\'') && !text.contains('\n') {
    format!("'{}'", text)
      .parse::<Value>()
      .unwrap_or_else(|_| Value::from(text))
  } else {
    Value::from(text)
  };
  *replacement.decor_mut() = value.decor().clone();
  *value = replacement;
  true
}
