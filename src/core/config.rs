//! lading.toml configuration
//!
//! ```toml
//! [bump]
//! exclude = ["internal-tools"]
//!
//! [bump.documentation]
//! globs = ["README.md", "docs/**/*.md"]
//!
//! [publish]
//! exclude = "xtask"
//! order = ["core", "macros", "facade"]
//! strip_patches = "per-crate"
//! ```
//!
//! Unknown keys are rejected.

use crate::core::error::{ConfigError, LadingResult, ResultExt};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up at the workspace root
pub const CONFIG_FILE_NAME: &str = "lading.toml";

const STRIP_PATCHES_ERROR: &str = "publish.strip_patches may be 'all', 'per-crate', or false.";

/// Top-level configuration for lading
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LadingConfig {
  #[serde(default)]
  pub bump: BumpConfig,
  #[serde(default)]
  pub publish: PublishConfig,
}

/// `[bump]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BumpConfig {
  /// Crates whose own version is left untouched by `lading bump`
  #[serde(default, deserialize_with = "string_or_seq")]
  pub exclude: Vec<String>,
  #[serde(default)]
  pub documentation: DocumentationConfig,
}

/// `[bump.documentation]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentationConfig {
  /// Glob patterns, relative to the workspace root, of Markdown files with TOML snippets
  #[serde(default, deserialize_with = "string_or_seq")]
  pub globs: Vec<String>,
}

/// `[publish]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
  #[serde(default, deserialize_with = "string_or_seq")]
  pub exclude: Vec<String>,
  #[serde(default, deserialize_with = "string_or_seq")]
  pub order: Vec<String>,
  #[serde(default)]
  pub strip_patches: StripPatchStrategy,
}

/// How `[patch]` sections are removed from staged manifests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StripPatchStrategy {
  /// Strip every `[patch]` section before publishing
  All,
  /// Strip only the patch entries of the crate being published
  #[default]
  PerCrate,
  /// Leave `[patch]` sections alone (`strip_patches = false`)
  Disabled,
}

impl fmt::Display for StripPatchStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StripPatchStrategy::All => write!(f, "all"),
      StripPatchStrategy::PerCrate => write!(f, "per-crate"),
      StripPatchStrategy::Disabled => write!(f, "disabled"),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStripPatches {
  Flag(bool),
  Name(String),
}

impl<'de> Deserialize<'de> for StripPatchStrategy {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = RawStripPatches::deserialize(deserializer).map_err(|_| de::Error::custom(STRIP_PATCHES_ERROR))?;
    match raw {
      RawStripPatches::Flag(false) => Ok(StripPatchStrategy::Disabled),
      RawStripPatches::Name(name) if name == "all" => Ok(StripPatchStrategy::All),
      RawStripPatches::Name(name) if name == "per-crate" => Ok(StripPatchStrategy::PerCrate),
      _ => Err(de::Error::custom(STRIP_PATCHES_ERROR)),
    }
  }
}

// Mirrors the configuration syntax: `false` rather than "disabled".
impl Serialize for StripPatchStrategy {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match self {
      StripPatchStrategy::All => serializer.serialize_str("all"),
      StripPatchStrategy::PerCrate => serializer.serialize_str("per-crate"),
      StripPatchStrategy::Disabled => serializer.serialize_bool(false),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
  One(String),
  Many(Vec<String>),
}

/// Accept either `key = "value"` or `key = ["a", "b"]`
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match OneOrMany::deserialize(deserializer) {
    Ok(OneOrMany::One(value)) => Ok(vec![value]),
    Ok(OneOrMany::Many(values)) => Ok(values),
    Err(_) => Err(de::Error::custom("expected a string or a list of strings")),
  }
}

impl LadingConfig {
  /// Path of the configuration file for a workspace root
  pub fn config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CONFIG_FILE_NAME)
  }

  /// Load `lading.toml` from the workspace root.
  ///
  /// A missing file is an error; callers that want defaults must decide that explicitly.
  pub fn load(workspace_root: &Path) -> LadingResult<Self> {
    let config_path = Self::config_path(workspace_root);
    if !config_path.is_file() {
      return Err(ConfigError::NotFound { path: config_path }.into());
    }

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content, &config_path)?;
    log::debug!("loaded configuration from {}", config_path.display());
    Ok(config)
  }

  /// Parse configuration text; `path` is only used for error messages.
  pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
    toml_edit::de::from_str(content).map_err(|err| ConfigError::Parse {
      path: path.to_path_buf(),
      message: err.to_string().trim().to_string(),
    })
  }
}
