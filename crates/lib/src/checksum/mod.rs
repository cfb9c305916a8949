//! Checksum manifest.
//!
//! Records the SHA-256 of every manifest that fed a regeneration run, so a
//! container build can detect when the cached dependency layer is stale.
//! The manifest is a JSON object mapping workspace-relative paths to hex
//! digests, with keys in sorted order.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::consts::MANIFEST_FILENAME;
use crate::members::MemberSet;
use crate::util::{ContentHash, hash_file, write_atomic};

/// Errors that can occur while computing or writing checksums.
#[derive(Debug, Error)]
pub enum ChecksumError {
  /// A file to be hashed does not exist.
  #[error("missing file for checksum: {}", path.display())]
  MissingFile { path: PathBuf },

  /// Reading or writing a file failed.
  #[error("checksum I/O failed at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The manifest could not be serialized.
  #[error("failed to serialize checksums: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Workspace-relative path to digest, in path order.
pub type Checksums = BTreeMap<String, ContentHash>;

/// The root manifest plus the manifest of every member in `member_sets`.
pub fn default_files<'a>(member_sets: impl IntoIterator<Item = &'a MemberSet>) -> Vec<String> {
  let mut files = vec![MANIFEST_FILENAME.to_string()];
  for members in member_sets {
    for member in members {
      files.push(format!("{}/{}", member, MANIFEST_FILENAME));
    }
  }
  files.sort();
  files.dedup();
  files
}

/// Files to hash for a run: the configured list, or [`default_files`] when none is configured.
pub fn checksum_files<'a>(config: &Config, member_sets: impl IntoIterator<Item = &'a MemberSet>) -> Vec<String> {
  if config.checksums.files.is_empty() {
    default_files(member_sets)
  } else {
    config.checksums.files.clone()
  }
}

/// Hash each workspace-relative file in `files`.
pub fn compute_checksums(config: &Config, files: &[String]) -> Result<Checksums, ChecksumError> {
  let mut checksums = Checksums::new();

  for file in files {
    let path = config.workspace_root.join(file);
    let hash = hash_file(&path).map_err(|source| {
      if source.kind() == io::ErrorKind::NotFound {
        ChecksumError::MissingFile { path: path.clone() }
      } else {
        ChecksumError::Io {
          path: path.clone(),
          source,
        }
      }
    })?;
    debug!(file = %file, hash = %hash, "hashed");
    checksums.insert(file.clone(), hash);
  }

  Ok(checksums)
}

/// Write `checksums` as pretty-printed JSON to the configured checksum path.
pub fn write_checksums(config: &Config, checksums: &Checksums) -> Result<PathBuf, ChecksumError> {
  let path = config.checksum_path();
  let mut json = serde_json::to_string_pretty(checksums)?;
  json.push('\n');

  write_atomic(&path, json).map_err(|source| ChecksumError::Io {
    path: path.clone(),
    source,
  })?;

  info!(path = %path.display(), files = checksums.len(), "wrote checksum manifest");
  Ok(path)
}
