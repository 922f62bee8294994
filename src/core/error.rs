//! Error types for lading with contextual messages and exit codes
//!
//! Every failure that can reach the user is one of the `LadingError` variants.
//! Each domain (configuration, workspace model, planning, staging, pre-flight)
//! owns a typed sub-error so callers and tests can match on the exact kind,
//! while the CLI boundary renders all of them the same way.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for lading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, broken workspace)
  User = 1,
  /// System error (I/O, external processes)
  System = 2,
  /// Validation failure (plan rejected, pre-flight failed)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for lading
#[derive(Debug)]
pub enum LadingError {
  /// Configuration errors (lading.toml)
  Config(ConfigError),

  /// Workspace metadata could not be turned into a model
  Workspace(WorkspaceModelError),

  /// Publish plan rejected
  Plan(PublishPlanError),

  /// Staging the workspace failed
  Preparation(PublishPreparationError),

  /// Pre-flight verification failed
  Preflight(PublishPreflightError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl LadingError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    LadingError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    LadingError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Typed errors keep their variant; context is only attached to free-form messages
  /// and I/O errors (which are converted into messages so the context is not lost).
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      LadingError::Message { message, context, help } => LadingError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      LadingError::Io(err) => LadingError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", err)),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      LadingError::Config(_) => ExitCode::User,
      LadingError::Workspace(_) => ExitCode::User,
      LadingError::Plan(_) => ExitCode::Validation,
      LadingError::Preparation(_) => ExitCode::User,
      LadingError::Preflight(_) => ExitCode::Validation,
      LadingError::Io(_) => ExitCode::System,
      LadingError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      LadingError::Config(e) => e.help_message(),
      LadingError::Workspace(e) => e.help_message(),
      LadingError::Plan(e) => e.help_message(),
      LadingError::Preparation(e) => e.help_message(),
      LadingError::Preflight(e) => e.help_message(),
      LadingError::Message { help, .. } => help.clone(),
      LadingError::Io(_) => None,
    }
  }
}

impl fmt::Display for LadingError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LadingError::Config(e) => write!(f, "{}", e),
      LadingError::Workspace(e) => write!(f, "{}", e),
      LadingError::Plan(e) => write!(f, "{}", e),
      LadingError::Preparation(e) => write!(f, "{}", e),
      LadingError::Preflight(e) => write!(f, "{}", e),
      LadingError::Io(e) => write!(f, "I/O error: {}", e),
      LadingError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for LadingError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      LadingError::Io(e) => Some(e),
      LadingError::Preparation(PublishPreparationError::Io { source, .. }) => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for LadingError {
  fn from(err: io::Error) -> Self {
    LadingError::Io(err)
  }
}

impl From<ConfigError> for LadingError {
  fn from(err: ConfigError) -> Self {
    LadingError::Config(err)
  }
}

impl From<WorkspaceModelError> for LadingError {
  fn from(err: WorkspaceModelError) -> Self {
    LadingError::Workspace(err)
  }
}

impl From<PublishPlanError> for LadingError {
  fn from(err: PublishPlanError) -> Self {
    LadingError::Plan(err)
  }
}

impl From<PublishPreparationError> for LadingError {
  fn from(err: PublishPreparationError) -> Self {
    LadingError::Preparation(err)
  }
}

impl From<PublishPreflightError> for LadingError {
  fn from(err: PublishPreflightError) -> Self {
    LadingError::Preflight(err)
  }
}

impl From<toml_edit::TomlError> for LadingError {
  fn from(err: toml_edit::TomlError) -> Self {
    LadingError::message(format!("TOML parse error: {}", err))
  }
}

impl From<cargo_metadata::Error> for LadingError {
  fn from(err: cargo_metadata::Error) -> Self {
    LadingError::Workspace(WorkspaceModelError::Metadata {
      message: err.to_string(),
    })
  }
}

impl From<serde_json::Error> for LadingError {
  fn from(err: serde_json::Error) -> Self {
    LadingError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for LadingError {
  fn from(err: semver::Error) -> Self {
    LadingError::message(format!("Invalid semantic version: {}", err))
  }
}

impl From<glob::PatternError> for LadingError {
  fn from(err: glob::PatternError) -> Self {
    LadingError::Config(ConfigError::Invalid {
      message: format!("invalid documentation glob: {}", err),
    })
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// lading.toml not found
  NotFound { path: PathBuf },

  /// lading.toml is not valid TOML or does not match the schema
  Parse { path: PathBuf, message: String },

  /// A value is well-formed but not allowed
  Invalid { message: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create lading.toml at the workspace root; an empty file accepts every default.".to_string())
      }
      ConfigError::Parse { .. } => Some("Only [bump] and [publish] tables are recognised in lading.toml.".to_string()),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "No lading configuration found.\nExpected file: {}", path.display())
      }
      ConfigError::Parse { path, message } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), message)
      }
      ConfigError::Invalid { message } => write!(f, "Invalid configuration: {}", message),
    }
  }
}

/// Errors raised while building the workspace model
#[derive(Debug)]
pub enum WorkspaceModelError {
  /// The requested workspace root does not exist
  RootNotFound { path: PathBuf },

  /// `cargo metadata` could not be run or returned garbage
  Metadata { message: String },

  /// Metadata parsed, but violates the model's invariants
  Invalid { message: String },
}

impl WorkspaceModelError {
  pub fn invalid(message: impl Into<String>) -> Self {
    WorkspaceModelError::Invalid {
      message: message.into(),
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      WorkspaceModelError::RootNotFound { .. } => {
        Some("Pass --workspace-root or run lading from inside the workspace.".to_string())
      }
      WorkspaceModelError::Metadata { .. } => Some("Run `cargo metadata --no-deps` to see the raw failure.".to_string()),
      WorkspaceModelError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for WorkspaceModelError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WorkspaceModelError::RootNotFound { path } => {
        write!(f, "Workspace root not found: {}", path.display())
      }
      WorkspaceModelError::Metadata { message } => write!(f, "cargo metadata failed: {}", message),
      WorkspaceModelError::Invalid { message } => write!(f, "Invalid workspace metadata: {}", message),
    }
  }
}

/// The workspace graph contains a cycle over normal/build edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCycleError {
  /// Sorted names of the crates that could not be ordered
  pub crates: Vec<String>,
}

impl fmt::Display for DependencyCycleError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Workspace dependency cycle detected among: {}", self.crates.join(", "))
  }
}

/// One reason a publish plan was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanIssue {
  /// Names listed more than once in publish.order
  DuplicateOrder(Vec<String>),
  /// Names in publish.order that are not publishable candidates
  UnknownInOrder(Vec<String>),
  /// Publishable candidates missing from publish.order
  OmittedFromOrder(Vec<String>),
  /// Candidates that form a cycle over non-dev edges
  Cycle(Vec<String>),
}

impl fmt::Display for PlanIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PlanIssue::DuplicateOrder(names) => write!(f, "Duplicate publish.order entries: {}", names.join(", ")),
      PlanIssue::UnknownInOrder(names) => write!(
        f,
        "publish.order references crates outside the publishable set: {}",
        names.join(", ")
      ),
      PlanIssue::OmittedFromOrder(names) => {
        write!(f, "publish.order omits publishable crates: {}", names.join(", "))
      }
      PlanIssue::Cycle(names) => write!(
        f,
        "Cannot determine publish order: dependency cycle detected among {}",
        names.join(", ")
      ),
    }
  }
}

/// The publish plan could not be built. All detected issues are reported at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlanError {
  pub issues: Vec<PlanIssue>,
}

impl PublishPlanError {
  fn help_message(&self) -> Option<String> {
    if self.issues.iter().any(|issue| matches!(issue, PlanIssue::Cycle(_))) {
      Some("Set publish.order explicitly, or break the cycle in the crate manifests.".to_string())
    } else {
      Some("publish.order must list every publishable crate exactly once.".to_string())
    }
  }
}

impl fmt::Display for PublishPlanError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
    write!(f, "{}", parts.join("; "))
  }
}

/// Staging the workspace for publication failed.
#[derive(Debug)]
pub enum PublishPreparationError {
  /// The build directory is the workspace root or lies inside it
  BuildDirectoryInsideWorkspace {
    build_directory: PathBuf,
    workspace_root: PathBuf,
  },

  /// The build directory is an ancestor of the workspace root
  BuildDirectoryContainsWorkspace {
    build_directory: PathBuf,
    workspace_root: PathBuf,
  },

  /// The clone destination would be created inside the workspace root
  CloneInsideWorkspace {
    destination: PathBuf,
    workspace_root: PathBuf,
  },

  /// A crate inherits the workspace README but the workspace has none
  MissingWorkspaceReadme { readme: PathBuf, crates: Vec<String> },

  /// A crate inheriting the workspace README lives outside the workspace root
  CrateOutsideWorkspace {
    crate_name: String,
    root_path: PathBuf,
    workspace_root: PathBuf,
  },

  /// Filesystem failure while staging
  Io {
    action: String,
    path: PathBuf,
    source: io::Error,
  },
}

impl PublishPreparationError {
  pub fn io(action: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
    PublishPreparationError::Io {
      action: action.into(),
      path: path.into(),
      source,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      PublishPreparationError::BuildDirectoryInsideWorkspace { .. }
      | PublishPreparationError::BuildDirectoryContainsWorkspace { .. }
      | PublishPreparationError::CloneInsideWorkspace { .. } => {
        Some("Pass a --build-directory outside the workspace, or omit it to use a temporary directory.".to_string())
      }
      PublishPreparationError::MissingWorkspaceReadme { .. } => {
        Some("Add README.md at the workspace root, or drop `readme.workspace = true` from the listed crates.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for PublishPreparationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishPreparationError::BuildDirectoryInsideWorkspace {
        build_directory,
        workspace_root,
      } => write!(
        f,
        "Build directory {} cannot reside within the workspace root {}",
        build_directory.display(),
        workspace_root.display()
      ),
      PublishPreparationError::BuildDirectoryContainsWorkspace {
        build_directory,
        workspace_root,
      } => write!(
        f,
        "Build directory {} contains the workspace root {}",
        build_directory.display(),
        workspace_root.display()
      ),
      PublishPreparationError::CloneInsideWorkspace {
        destination,
        workspace_root,
      } => write!(
        f,
        "Staged workspace {} cannot be nested inside the workspace root {}",
        destination.display(),
        workspace_root.display()
      ),
      PublishPreparationError::MissingWorkspaceReadme { readme, crates } => write!(
        f,
        "Workspace README.md is required by crates that set readme.workspace = true ({}); expected {}",
        crates.join(", "),
        readme.display()
      ),
      PublishPreparationError::CrateOutsideWorkspace {
        crate_name,
        root_path,
        workspace_root,
      } => write!(
        f,
        "Crate {} at {} lies outside the workspace root {}",
        crate_name,
        root_path.display(),
        workspace_root.display()
      ),
      PublishPreparationError::Io { action, path, source } => {
        write!(f, "Failed to {} {}: {}", action, path.display(), source)
      }
    }
  }
}

/// Pre-flight verification of the staged workspace failed.
#[derive(Debug)]
pub enum PublishPreflightError {
  /// `git status --porcelain` reported changes
  DirtyWorkingTree { root: PathBuf, changes: Vec<String> },

  /// git could not inspect the directory
  NotARepository { root: PathBuf, stderr: String },

  /// An external command exited unsuccessfully
  CommandFailed {
    command: String,
    exit_code: Option<i32>,
    output: String,
  },

  /// An external command could not be started at all
  Spawn { command: String, source: io::Error },
}

impl PublishPreflightError {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishPreflightError::DirtyWorkingTree { .. } => {
        Some("Commit or stash your changes, or rerun with --allow-dirty.".to_string())
      }
      PublishPreflightError::NotARepository { .. } => {
        Some("Run lading publish from a git checkout, or pass --allow-dirty to skip the check.".to_string())
      }
      PublishPreflightError::Spawn { .. } => Some("Make sure git and cargo are on PATH.".to_string()),
      PublishPreflightError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for PublishPreflightError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishPreflightError::DirtyWorkingTree { root, changes } => {
        write!(f, "Workspace at {} has uncommitted changes:", root.display())?;
        for change in changes {
          write!(f, "\n  {}", change)?;
        }
        Ok(())
      }
      PublishPreflightError::NotARepository { root, stderr } => write!(
        f,
        "Unable to inspect git repository at {}: {}",
        root.display(),
        stderr.trim()
      ),
      PublishPreflightError::CommandFailed {
        command,
        exit_code,
        output,
      } => {
        match exit_code {
          Some(code) => write!(f, "Pre-flight `{}` failed with exit code {}", command, code)?,
          None => write!(f, "Pre-flight `{}` was terminated by a signal", command)?,
        }
        let output = output.trim();
        if !output.is_empty() {
          write!(f, ":\n{}", output)?;
        }
        Ok(())
      }
      PublishPreflightError::Spawn { command, source } => {
        write!(f, "Failed to run `{}`: {}", command, source)
      }
    }
  }
}

/// Result type alias for lading
pub type LadingResult<T> = Result<T, LadingError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> LadingResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> LadingResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<LadingError>,
{
  fn context(self, ctx: impl Into<String>) -> LadingResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> LadingResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &LadingError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
