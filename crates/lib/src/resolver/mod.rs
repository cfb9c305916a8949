//! External lockfile resolution.
//!
//! Version resolution is delegated to an external program (by default
//! `cargo generate-lockfile`). This module prepares an isolated scratch
//! workspace for one target, runs the resolver inside it under a timeout, and
//! copies the produced lockfile into the target's output directory.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{Config, ResolverConfig};
use crate::consts::{LOCK_FILENAME, MANIFEST_FILENAME};
use crate::members::MemberSet;
use crate::scratch::{ScratchError, materialize_scratch_tree};
use crate::util::write_atomic;

/// Errors that can occur while running the resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
  /// The resolver executable is not available.
  #[error("resolver '{program}' not found: {source}")]
  NotFound {
    program: String,
    #[source]
    source: which::Error,
  },

  /// The resolver process could not be started.
  #[error("failed to spawn resolver '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The resolver did not finish in time and was killed.
  #[error("resolver timed out after {timeout:?} for target '{target}'")]
  Timeout { target: String, timeout: Duration },

  /// The resolver exited unsuccessfully.
  #[error("resolver failed for target '{target}' ({})", describe_exit(*code))]
  Failed {
    target: String,
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },

  /// The resolver succeeded but produced no lockfile.
  #[error("resolver produced no lockfile at {}", path.display())]
  MissingLockfile { path: PathBuf },

  /// Preparing the scratch tree failed.
  #[error(transparent)]
  Scratch(#[from] ScratchError),

  /// A filesystem operation failed.
  #[error("resolver I/O failed at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A resolver invocation with placeholders substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverCommand {
  pub program: String,
  pub args: Vec<String>,
}

impl ResolverCommand {
  /// Substitute `{manifest}` and `{scratch}` in the configured arguments.
  pub fn new(resolver: &ResolverConfig, manifest: &Path, scratch: &Path) -> Self {
    let manifest = manifest.display().to_string();
    let scratch = scratch.display().to_string();
    let args = resolver
      .args
      .iter()
      .map(|arg| arg.replace("{manifest}", &manifest).replace("{scratch}", &scratch))
      .collect();

    Self {
      program: resolver.program.clone(),
      args,
    }
  }

  fn command(&self, cwd: &Path) -> Command {
    let mut command = Command::new(&self.program);
    command
      .args(&self.args)
      .current_dir(cwd)
      .stdin(Stdio::null())
      .kill_on_drop(true);
    command
  }
}

impl fmt::Display for ResolverCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Check that the resolver executable can be found.
///
/// Runs before any target is processed.
pub fn ensure_available(resolver: &ResolverConfig) -> Result<PathBuf, ResolverError> {
  let path = which::which(&resolver.program).map_err(|source| ResolverError::NotFound {
    program: resolver.program.clone(),
    source,
  })?;
  debug!(program = %resolver.program, path = %path.display(), "resolver available");
  Ok(path)
}

/// Resolve a fresh lockfile for `target` and store it in the output directory.
///
/// `manifest` is the synthetic root manifest text for the target. The scratch
/// workspace lives in a temporary directory that is removed on return,
/// whether or not resolution succeeded.
pub async fn generate_lockfile(
  config: &Config,
  target: &str,
  manifest: &str,
  members: &MemberSet,
) -> Result<PathBuf, ResolverError> {
  let scratch = tempfile::Builder::new()
    .prefix(&format!("cargo-chef-{}-", target))
    .tempdir()
    .map_err(|source| ResolverError::Io {
      path: std::env::temp_dir(),
      source,
    })?;
  let scratch_root = scratch.path();

  let scratch_manifest = scratch_root.join(MANIFEST_FILENAME);
  fs::write(&scratch_manifest, manifest).map_err(|source| ResolverError::Io {
    path: scratch_manifest.clone(),
    source,
  })?;
  materialize_scratch_tree(config, scratch_root, target, members)?;

  let command = ResolverCommand::new(&config.resolver, &scratch_manifest, scratch_root);
  run(&command, config.resolver.timeout, target, scratch_root).await?;

  let produced = scratch_root.join(LOCK_FILENAME);
  let lock = match fs::read(&produced) {
    Ok(lock) => lock,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      return Err(ResolverError::MissingLockfile { path: produced });
    }
    Err(source) => return Err(ResolverError::Io { path: produced, source }),
  };

  let dest = config.target_lock_path(target);
  write_atomic(&dest, &lock).map_err(|source| ResolverError::Io {
    path: dest.clone(),
    source,
  })?;

  info!(target = %target, path = %dest.display(), "generated lockfile");
  Ok(dest)
}

fn describe_exit(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "terminated by signal".to_string(),
  }
}

async fn run(command: &ResolverCommand, timeout: Duration, target: &str, cwd: &Path) -> Result<(), ResolverError> {
  debug!(target = %target, command = %command, cwd = %cwd.display(), "spawning resolver");

  let output = match tokio::time::timeout(timeout, command.command(cwd).output()).await {
    Ok(result) => result.map_err(|source| ResolverError::Spawn {
      program: command.program.clone(),
      source,
    })?,
    Err(_) => {
      return Err(ResolverError::Timeout {
        target: target.to_string(),
        timeout,
      });
    }
  };

  let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
  let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

  if !output.status.success() {
    return Err(ResolverError::Failed {
      target: target.to_string(),
      code: output.status.code(),
      stdout,
      stderr,
    });
  }

  if !stderr.is_empty() {
    debug!(stderr = %stderr.trim_end(), "resolver stderr");
  }
  Ok(())
}
