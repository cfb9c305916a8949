mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chefsync_lib::consts::{APP_NAME, DEFAULT_SUMMARY_FILENAME};

use crate::cmd::{cmd_checksums, cmd_diff, cmd_members, cmd_regenerate};
use crate::output::{OutputFormat, print_error};

/// chefsync - keep cargo-chef dependency workspaces in sync
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Workspace root containing the top-level Cargo.toml
  #[arg(short, long, global = true, env = "CHEFSYNC_WORKSPACE", default_value = ".")]
  workspace: PathBuf,

  /// Config file (default: chefsync.toml in the workspace root)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Regenerate target manifests and lockfiles and report dependency changes
  Regenerate {
    /// Where to write the JSON change summary
    #[arg(long, default_value = DEFAULT_SUMMARY_FILENAME)]
    summary_path: PathBuf,

    /// Only process these targets (default: all configured targets)
    #[arg(short, long = "target")]
    targets: Vec<String>,

    /// Skip writing the checksum manifest
    #[arg(long)]
    no_checksums: bool,

    /// Resolver timeout (e.g., "90s", "10m"), overriding the config
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// List the workspace members a target depends on
  Members {
    /// Configured target name
    #[arg(required_unless_present = "root")]
    target: Option<String>,

    /// Walk from this member path instead of a target's root
    #[arg(long, conflicts_with = "target")]
    root: Option<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Compare two lockfiles without running the resolver
  Diff {
    /// Previous lockfile
    old: PathBuf,

    /// New lockfile
    new: PathBuf,

    /// Target name to label the summary with
    #[arg(short, long, default_value = "lockfile")]
    target: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Recompute and write the checksum manifest
  Checksums {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let workspace = cli.workspace.as_path();
  let config = cli.config.as_deref();

  let result = match cli.command {
    Commands::Regenerate {
      summary_path,
      targets,
      no_checksums,
      timeout,
      output,
    } => cmd_regenerate(
      workspace,
      config,
      cmd::RegenerateArgs {
        summary_path,
        targets,
        write_checksums: !no_checksums,
        timeout,
      },
      output,
    ),
    Commands::Members { target, root, output } => cmd_members(workspace, config, target, root, output),
    Commands::Diff {
      old,
      new,
      target,
      output,
    } => cmd_diff(&old, &new, &target, output),
    Commands::Checksums { output } => cmd_checksums(workspace, config, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();
}
