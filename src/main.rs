mod bump;
mod cargo;
mod commands;
mod core;
mod graph;
mod release;
mod utils;

use clap::{Parser, Subcommand};
use core::error::{LadingError, print_error};
use release::staging::PublishOptions;
use std::path::PathBuf;

/// Version bumping and publish planning for Cargo workspaces
#[derive(Parser)]
#[command(name = "lading")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Root of the Cargo workspace (must contain lading.toml)
  #[arg(long, global = true, env = "LADING_WORKSPACE_ROOT", default_value = ".")]
  workspace_root: PathBuf,

  /// Show debug logging on stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Set a new version across the workspace manifests and documentation
  Bump {
    /// New semantic version, e.g. 1.2.3
    #[arg(id = "new_version", value_name = "VERSION")]
    version: String,
    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,
  },

  /// Plan publication, stage the workspace and run pre-flight checks
  Publish {
    /// Directory to stage the workspace in (default: a fresh temporary directory)
    #[arg(long)]
    build_directory: Option<PathBuf>,
    /// Skip the clean working tree check
    #[arg(long)]
    allow_dirty: bool,
    /// Remove the build directory when finished
    #[arg(long)]
    cleanup: bool,
    /// Copy the files symlinks point to instead of the symlinks themselves
    #[arg(long)]
    dereference_symlinks: bool,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
    .format_timestamp(None)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  // Build workspace context once (root, lading.toml, cargo metadata)
  let ctx = match core::context::WorkspaceContext::build(&cli.workspace_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Bump { version, dry_run } => commands::run_bump(&ctx, &version, dry_run),
    Commands::Publish {
      build_directory,
      allow_dirty,
      cleanup,
      dereference_symlinks,
      json,
    } => {
      let options = PublishOptions {
        build_directory,
        cleanup,
        preserve_symlinks: !dereference_symlinks,
        allow_dirty,
      };
      commands::run_publish(&ctx, &options, json)
    }
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: LadingError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
