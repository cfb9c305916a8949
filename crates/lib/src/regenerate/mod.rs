//! The regeneration pipeline.
//!
//! For every selected target, in name order:
//! 1. Walk the target's local path dependencies
//! 2. Write the synthetic manifest
//! 3. Snapshot the previous lockfile
//! 4. Run the resolver in a scratch tree and store the new lockfile
//! 5. Diff the two snapshots
//!
//! Configuration problems (unknown targets, a missing resolver, a malformed
//! root manifest) are detected before any target is touched. Any later
//! failure aborts the run; outputs already written for earlier targets stay
//! in place and are recomputed on the next run.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::checksum::{self, ChecksumError};
use crate::config::{Config, ConfigError};
use crate::diff::{TargetSummary, diff};
use crate::lock::{LockError, parse_packages};
use crate::manifest::{ManifestError, load_root_manifest, write_manifest};
use crate::members::{GraphError, MemberSet, resolve_members};
use crate::resolver::{ResolverError, ensure_available, generate_lockfile};
use crate::util::write_atomic;

/// Errors that can abort a regeneration run.
#[derive(Debug, Error)]
pub enum RegenerateError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Resolver(#[from] ResolverError),

  #[error(transparent)]
  Lock(#[from] LockError),

  #[error(transparent)]
  Checksum(#[from] ChecksumError),

  /// The summary file could not be written.
  #[error("failed to write summary {}: {source}", path.display())]
  Summary {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The summary could not be serialized.
  #[error("failed to serialize summary: {0}")]
  Serialize(#[from] serde_json::Error),
}

impl RegenerateError {
  /// Whether the run failed on its configuration rather than on a target.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      RegenerateError::Config(_)
        | RegenerateError::Resolver(ResolverError::NotFound { .. })
        | RegenerateError::Manifest(
          ManifestError::Read { .. }
            | ManifestError::Parse(_)
            | ManifestError::MissingWorkspace
            | ManifestError::MissingMembers
        )
    )
  }
}

/// Options for a regeneration run.
#[derive(Debug, Clone)]
pub struct RegenerateOptions {
  /// Targets to process. Empty means every configured target.
  pub targets: Vec<String>,
  /// Where to write the JSON summary, if anywhere.
  pub summary_path: Option<PathBuf>,
  /// Whether to write the checksum manifest after all targets succeed.
  pub write_checksums: bool,
}

impl Default for RegenerateOptions {
  fn default() -> Self {
    Self {
      targets: Vec::new(),
      summary_path: None,
      write_checksums: true,
    }
  }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RegenerateResult {
  /// One summary per processed target, in name order.
  pub summaries: Vec<TargetSummary>,
  /// The member set of each processed target.
  pub members: BTreeMap<String, MemberSet>,
  /// Path of the written summary file.
  pub summary_path: Option<PathBuf>,
  /// Path of the written checksum manifest.
  pub checksum_path: Option<PathBuf>,
  pub duration: Duration,
}

impl RegenerateResult {
  pub fn change_count(&self) -> usize {
    self.summaries.iter().map(TargetSummary::change_count).sum()
  }
}

/// Regenerate manifests and lockfiles for the selected targets.
pub async fn regenerate(config: &Config, options: &RegenerateOptions) -> Result<RegenerateResult, RegenerateError> {
  let start = Instant::now();

  let targets = select_targets(config, &options.targets)?;
  ensure_available(&config.resolver)?;
  load_root_manifest(config)?;

  info!(targets = targets.len(), workspace = %config.workspace_root.display(), "starting regeneration");

  let mut summaries = Vec::with_capacity(targets.len());
  let mut members = BTreeMap::new();

  for target in targets {
    let (summary, target_members) = regenerate_target(config, &target).await?;
    summaries.push(summary);
    members.insert(target, target_members);
  }

  let summary_path = match &options.summary_path {
    Some(path) => Some(write_summary(path, &summaries)?),
    None => None,
  };

  let checksum_path = if options.write_checksums {
    let files = checksum::checksum_files(config, members.values());
    let checksums = checksum::compute_checksums(config, &files)?;
    Some(checksum::write_checksums(config, &checksums)?)
  } else {
    None
  };

  let result = RegenerateResult {
    summaries,
    members,
    summary_path,
    checksum_path,
    duration: start.elapsed(),
  };
  info!(
    changes = result.change_count(),
    duration_ms = result.duration.as_millis() as u64,
    "regeneration complete"
  );
  Ok(result)
}

async fn regenerate_target(config: &Config, target: &str) -> Result<(TargetSummary, MemberSet), RegenerateError> {
  let root = config.target(target)?.root.clone();

  let members = resolve_members(config, &root)?;
  info!(target = %target, root = %root, members = members.len(), "resolved members");

  let manifest = write_manifest(config, target, &members)?;

  let lock_path = config.target_lock_path(target);
  let old = parse_packages(&lock_path)?;
  if old.is_empty() {
    info!(target = %target, path = %lock_path.display(), "no previous lockfile");
  }

  generate_lockfile(config, target, &manifest, &members).await?;
  let new = parse_packages(&lock_path)?;

  let summary = diff(target, &old, &new);
  info!(
    target = %target,
    added = summary.added.len(),
    removed = summary.removed.len(),
    updated = summary.updated.len(),
    "diffed lockfiles"
  );

  Ok((summary, members))
}

/// Validate requested target names and order them by name.
fn select_targets(config: &Config, requested: &[String]) -> Result<Vec<String>, ConfigError> {
  if requested.is_empty() {
    return Ok(config.targets.keys().cloned().collect());
  }

  let mut selected = BTreeSet::new();
  for name in requested {
    config.target(name)?;
    selected.insert(name.clone());
  }
  Ok(selected.into_iter().collect())
}

/// Write `summaries` as a pretty-printed JSON array.
pub fn write_summary(path: &Path, summaries: &[TargetSummary]) -> Result<PathBuf, RegenerateError> {
  let mut json = serde_json::to_string_pretty(summaries)?;
  json.push('\n');

  write_atomic(path, json).map_err(|source| RegenerateError::Summary {
    path: path.to_path_buf(),
    source,
  })?;

  info!(path = %path.display(), "wrote summary");
  Ok(path.to_path_buf())
}
