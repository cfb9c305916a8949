//! Diff command implementation.
//!
//! Compares two lockfiles and displays added/removed/updated packages.

use std::path::Path;

use anyhow::{Context, Result, bail};

use chefsync_lib::diff::diff;
use chefsync_lib::lock::{LockSnapshot, parse_packages};

use crate::output::{OutputFormat, print_json, print_summary};

pub fn cmd_diff(old: &Path, new: &Path, target: &str, output: OutputFormat) -> Result<()> {
  let old_snapshot = load(old)?;
  let new_snapshot = load(new)?;

  let summary = diff(target, &old_snapshot, &new_snapshot);

  if output.is_json() {
    print_json(&summary)?;
  } else {
    print_summary(&summary);
  }

  Ok(())
}

fn load(path: &Path) -> Result<LockSnapshot> {
  // parse_packages would read a missing file as an empty lockfile.
  if !path.exists() {
    bail!("Lockfile not found: {}", path.display());
  }
  parse_packages(path).with_context(|| format!("Failed to read lockfile: {}", path.display()))
}
