//! Implementation of the `chefsync regenerate` command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use chefsync_lib::diff::TargetSummary;
use chefsync_lib::regenerate::{RegenerateError, RegenerateOptions, regenerate};
use chefsync_lib::resolver::ResolverError;

use super::{load_config, runtime};
use crate::output::{
  OutputFormat, format_duration, print_json, print_stat, print_success, print_summary,
};

pub struct RegenerateArgs {
  pub summary_path: PathBuf,
  pub targets: Vec<String>,
  pub write_checksums: bool,
  pub timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct RegenerateReport<'a> {
  summaries: &'a [TargetSummary],
  summary_path: Option<&'a Path>,
  checksum_path: Option<&'a Path>,
  duration_ms: u64,
}

/// Execute the regenerate command.
///
/// Rewrites every selected target's manifest and lockfile, then prints the
/// per-target package changes. When the resolver fails, its captured output
/// is echoed to stderr before the error.
pub fn cmd_regenerate(
  workspace: &Path,
  config: Option<&Path>,
  args: RegenerateArgs,
  output: OutputFormat,
) -> Result<()> {
  let mut config = load_config(workspace, config)?;
  if let Some(timeout) = args.timeout {
    config.resolver.timeout = timeout;
  }

  let options = RegenerateOptions {
    targets: args.targets,
    summary_path: Some(args.summary_path),
    write_checksums: args.write_checksums,
  };

  let rt = runtime()?;
  let result = match rt.block_on(regenerate(&config, &options)) {
    Ok(result) => result,
    Err(err) => {
      print_resolver_output(&err);
      return Err(err).context("Regeneration failed");
    }
  };

  if output.is_json() {
    print_json(&RegenerateReport {
      summaries: &result.summaries,
      summary_path: result.summary_path.as_deref(),
      checksum_path: result.checksum_path.as_deref(),
      duration_ms: result.duration.as_millis() as u64,
    })?;
    return Ok(());
  }

  for summary in &result.summaries {
    print_summary(summary);
  }
  println!();
  print_success("Regeneration complete!");
  print_stat("Targets", &result.summaries.len().to_string());
  print_stat("Changes", &result.change_count().to_string());
  if let Some(path) = &result.summary_path {
    print_stat("Summary", &path.display().to_string());
  }
  if let Some(path) = &result.checksum_path {
    print_stat("Checksums", &path.display().to_string());
  }
  print_stat("Duration", &format_duration(result.duration));

  Ok(())
}

fn print_resolver_output(err: &RegenerateError) {
  if let RegenerateError::Resolver(ResolverError::Failed { stdout, stderr, .. }) = err {
    if !stdout.is_empty() {
      eprint!("{}", stdout);
    }
    if !stderr.is_empty() {
      eprint!("{}", stderr);
    }
  }
}
