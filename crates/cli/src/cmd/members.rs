use std::path::Path;

use anyhow::{Context, Result};

use chefsync_lib::members::resolve_members;

use super::load_config;
use crate::output::{OutputFormat, print_json};

/// Print the member set of a target, or of an arbitrary root member.
pub fn cmd_members(
  workspace: &Path,
  config: Option<&Path>,
  target: Option<String>,
  root: Option<String>,
  output: OutputFormat,
) -> Result<()> {
  let config = load_config(workspace, config)?;

  let root = match (target, root) {
    (Some(target), _) => config.target(&target)?.root.clone(),
    (None, Some(root)) => root,
    (None, None) => anyhow::bail!("Either a target or --root is required"),
  };

  let members = resolve_members(&config, &root).with_context(|| format!("Failed to resolve members of {}", root))?;

  if output.is_json() {
    print_json(&members)?;
  } else {
    for member in &members {
      println!("{}", member);
    }
  }

  Ok(())
}
