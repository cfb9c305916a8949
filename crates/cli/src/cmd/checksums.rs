use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use chefsync_lib::checksum::{checksum_files, compute_checksums, write_checksums};
use chefsync_lib::members::resolve_members;

use super::load_config;
use crate::output::{OutputFormat, print_json, print_stat, print_success, truncate_hash};

/// Recompute the checksum manifest from the current workspace state.
pub fn cmd_checksums(workspace: &Path, config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let config = load_config(workspace, config)?;

  let mut member_sets = BTreeMap::new();
  if config.checksums.files.is_empty() {
    for (name, target) in &config.targets {
      let members = resolve_members(&config, &target.root)
        .with_context(|| format!("Failed to resolve members of target {}", name))?;
      member_sets.insert(name.clone(), members);
    }
  }

  let files = checksum_files(&config, member_sets.values());
  let checksums = compute_checksums(&config, &files).context("Failed to compute checksums")?;
  let path = write_checksums(&config, &checksums).context("Failed to write checksums")?;

  if output.is_json() {
    print_json(&checksums)?;
  } else {
    for (file, hash) in &checksums {
      print_stat(file, truncate_hash(&hash.0));
    }
    print_success(&format!("Wrote {}", path.display()));
  }

  Ok(())
}
