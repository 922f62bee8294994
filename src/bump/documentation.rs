//! Version rewriting inside ```` ```toml ```` fences of Markdown files
//!
//! Only fences whose info string starts with `toml` are touched. The fence body
//! is parsed with `toml_edit`; bodies that fail to parse are left exactly as
//! they were. Indentation of indented fences (e.g. inside list items) and CRLF
//! line endings are preserved.

use crate::cargo::manifest::{update_dependency_requirements, update_workspace_dependency_requirements};
use std::collections::BTreeSet;
use toml_edit::DocumentMut;

const FENCE: &str = "```";

/// Rewrite dependency requirements on `crate_names` inside TOML fences.
///
/// Returns `None` when nothing changed.
pub fn rewrite_toml_fences(markdown: &str, crate_names: &BTreeSet<String>, version: &str) -> Option<String> {
  let lines: Vec<&str> = markdown.split_inclusive('\n').collect();
  let mut out = String::with_capacity(markdown.len());
  let mut changed = false;
  let mut i = 0;

  while i < lines.len() {
    let line = lines[i];
    let Some(indent) = toml_fence_indent(line) else {
      out.push_str(line);
      i += 1;
      continue;
    };

    let Some(close) = (i + 1..lines.len()).find(|&j| is_closing_fence(lines[j])) else {
      // Unterminated fence: copy the rest verbatim
      for rest in &lines[i..] {
        out.push_str(rest);
      }
      break;
    };

    out.push_str(line);
    let body = &lines[i + 1..close];
    match rewrite_fence_body(body, indent, crate_names, version) {
      Some(rewritten) => {
        out.push_str(&rewritten);
        changed = true;
      }
      None => body.iter().for_each(|l| out.push_str(l)),
    }
    out.push_str(lines[close]);
    i = close + 1;
  }

  changed.then_some(out)
}

/// Leading whitespace of a line opening a TOML fence
fn toml_fence_indent(line: &str) -> Option<&str> {
  let trimmed = line.trim_start();
  let indent = &line[..line.len() - trimmed.len()];
  let info = trimmed.strip_prefix(FENCE)?.trim();
  let lang = info.split(|c: char| c.is_whitespace() || c == ',' || c == '{').next()?;
  lang.eq_ignore_ascii_case("toml").then_some(indent)
}

fn is_closing_fence(line: &str) -> bool {
  line.trim() == FENCE
}

fn rewrite_fence_body(body: &[&str], indent: &str, crate_names: &BTreeSet<String>, version: &str) -> Option<String> {
  let crlf = body.iter().any(|line| line.ends_with("\r\n"));

  let mut snippet = String::new();
  for line in body {
    let content = line.trim_end_matches(['\r', '\n']);
    let content = content.strip_prefix(indent).unwrap_or(content);
    snippet.push_str(content);
    snippet.push('\n');
  }

  let mut doc = snippet.parse::<DocumentMut>().ok()?;
  let mut changed = update_dependency_requirements(&mut doc, crate_names, version);
  changed |= update_workspace_dependency_requirements(&mut doc, crate_names, version);
  if !changed {
    return None;
  }

  let ending = if crlf { "\r\n" } else { "\n" };
  let mut rendered = String::new();
  for line in doc.to_string().lines() {
    if !line.is_empty() {
      rendered.push_str(indent);
    }
    rendered.push_str(line);
    rendered.push_str(ending);
  }
  Some(rendered)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names() -> BTreeSet<String> {
    ["alpha".to_string(), "beta".to_string()].into_iter().collect()
  }

  #[test]
  fn test_rewrites_dependency_in_toml_fence() {
    let markdown = "# Usage\n\n```toml\n[dependencies]\nalpha = \"0.1.0\"\nserde = \"1\"\n```\n";
    let updated = rewrite_toml_fences(markdown, &names(), "1.2.3").unwrap();
    assert_eq!(
      updated,
      "# Usage\n\n```toml\n[dependencies]\nalpha = \"1.2.3\"\nserde = \"1\"\n```\n"
    );
  }

  #[test]
  fn test_other_fences_and_prose_untouched() {
    let markdown = "alpha = \"0.1.0\"\n\n```rust\nlet alpha = \"0.1.0\";\n```\n\n```\nalpha = \"0.1.0\"\n```\n";
    assert_eq!(rewrite_toml_fences(markdown, &names(), "1.2.3"), None);
  }

  #[test]
  fn test_unparsable_fence_untouched() {
    let markdown = "```toml\n[dependencies\nalpha = \"0.1.0\"\n```\n";
    assert_eq!(rewrite_toml_fences(markdown, &names(), "1.2.3"), None);
  }

  #[test]
  fn test_indented_fence_keeps_indentation() {
    let markdown = "1. Add:\n\n   ```toml\n   [dependencies]\n   beta = { version = \"^0.1\", features = [\"x\"] }\n   ```\n";
    let updated = rewrite_toml_fences(markdown, &names(), "2.0.0").unwrap();
    assert_eq!(
      updated,
      "1. Add:\n\n   ```toml\n   [dependencies]\n   beta = { version = \"^2.0.0\", features = [\"x\"] }\n   ```\n"
    );
  }

  #[test]
  fn test_crlf_line_endings_preserved() {
    let markdown = "```toml\r\n[dependencies]\r\nalpha = \"0.1.0\"\r\n```\r\n";
    let updated = rewrite_toml_fences(markdown, &names(), "1.2.3").unwrap();
    assert_eq!(updated, "```toml\r\n[dependencies]\r\nalpha = \"1.2.3\"\r\n```\r\n");
  }

  #[test]
  fn test_unterminated_fence_untouched() {
    let markdown = "```toml\n[dependencies]\nalpha = \"0.1.0\"\n";
    assert_eq!(rewrite_toml_fences(markdown, &names(), "1.2.3"), None);
  }

  #[test]
  fn test_info_string_with_attributes() {
    let markdown = "```toml,ignore\n[dependencies]\nalpha = \"0.1\"\n```\n";
    let updated = rewrite_toml_fences(markdown, &names(), "0.3.0").unwrap();
    assert!(updated.contains("alpha = \"0.3.0\""), "{}", updated);
  }
}
