mod checksums;
mod diff;
mod members;
mod regenerate;

use std::path::Path;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use chefsync_lib::config::Config;

pub use checksums::cmd_checksums;
pub use diff::cmd_diff;
pub use members::cmd_members;
pub use regenerate::{RegenerateArgs, cmd_regenerate};

/// Load the run configuration for `workspace`.
fn load_config(workspace: &Path, config: Option<&Path>) -> Result<Config> {
  let config = Config::load(workspace, config).context("Failed to load configuration")?;
  debug!(
    workspace = %config.workspace_root.display(),
    output_dir = %config.output_dir.display(),
    targets = config.targets.len(),
    "configuration loaded"
  );
  Ok(config)
}

/// Single-threaded runtime; targets run one at a time.
fn runtime() -> Result<Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
