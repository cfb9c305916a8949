//! Lockfile parsing.
//!
//! Reads a `Cargo.lock` into a [`LockSnapshot`]: a map from
//! `(package name, source)` to the pinned version.
//!
//! The parser is a line-oriented state machine rather than a full TOML
//! parse. It only needs the `name`, `version`, and `source` fields of each
//! `[[package]]` record and tolerates partial or future lock formats:
//!
//! ```text
//!                 [[package]]                   other [section]
//! AwaitingRecord ─────────────► InRecord ───────────────────────► AwaitingRecord
//!                               │  ▲  key = value (stored)
//!                               └──┘  [[package]] (flush, reopen)
//! ```
//!
//! A record is flushed into the snapshot only if it has both a `name` and a
//! `version`; incomplete records are dropped.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{trace, warn};

const PACKAGE_MARKER: &str = "[[package]]";

/// Errors that can occur when reading a lockfile.
#[derive(Debug, Error)]
pub enum LockError {
  /// The lockfile exists but could not be read.
  #[error("failed to read lockfile {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Identity of a locked package.
///
/// An empty `source` denotes a path (workspace-local) package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageKey {
  pub name: String,
  pub source: String,
}

impl PackageKey {
  pub fn new(name: &str, source: &str) -> Self {
    Self {
      name: name.to_string(),
      source: source.to_string(),
    }
  }

  /// Key for a path package (no source).
  pub fn path(name: &str) -> Self {
    Self::new(name, "")
  }

  pub fn is_path(&self) -> bool {
    self.source.is_empty()
  }
}

impl std::fmt::Display for PackageKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.is_path() {
      write!(f, "{} (path)", self.name)
    } else {
      write!(f, "{} ({})", self.name, self.source)
    }
  }
}

/// Every package pinned by one lockfile, keyed by name and source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSnapshot {
  packages: BTreeMap<PackageKey, String>,
}

impl LockSnapshot {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &PackageKey) -> Option<&str> {
    self.packages.get(key).map(String::as_str)
  }

  pub fn contains(&self, key: &PackageKey) -> bool {
    self.packages.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }

  pub fn iter(&self) -> btree_map::Iter<'_, PackageKey, String> {
    self.packages.iter()
  }
}

impl FromIterator<(PackageKey, String)> for LockSnapshot {
  fn from_iter<I: IntoIterator<Item = (PackageKey, String)>>(iter: I) -> Self {
    Self {
      packages: iter.into_iter().collect(),
    }
  }
}

impl<'a> IntoIterator for &'a LockSnapshot {
  type Item = (&'a PackageKey, &'a String);
  type IntoIter = btree_map::Iter<'a, PackageKey, String>;

  fn into_iter(self) -> Self::IntoIter {
    self.packages.iter()
  }
}

/// Fields collected for the `[[package]]` record currently being read.
#[derive(Debug, Default)]
struct PendingRecord {
  fields: BTreeMap<String, String>,
}

impl PendingRecord {
  /// The snapshot entry for this record, if it has both a name and a version.
  fn into_entry(mut self) -> Option<(PackageKey, String)> {
    let Some(name) = self.fields.remove("name") else {
      trace!("dropping lock record without name");
      return None;
    };
    let Some(version) = self.fields.remove("version") else {
      trace!(package = %name, "dropping lock record without version");
      return None;
    };
    let source = self.fields.remove("source").unwrap_or_default();
    Some((PackageKey { name, source }, version))
  }
}

enum ParseState {
  AwaitingRecord,
  InRecord(PendingRecord),
}

impl ParseState {
  /// Close the current record (if any), inserting it when complete.
  fn flush(self, packages: &mut BTreeMap<PackageKey, String>) {
    if let ParseState::InRecord(record) = self
      && let Some((key, version)) = record.into_entry()
      && let Some(previous) = packages.insert(key.clone(), version)
    {
      warn!(package = %key, previous = %previous, "duplicate lock entry, keeping the later one");
    }
  }
}

/// Parse lockfile text into a snapshot.
pub fn parse_str(content: &str) -> LockSnapshot {
  let mut packages = BTreeMap::new();
  let mut state = ParseState::AwaitingRecord;

  for raw_line in content.lines() {
    let line = raw_line.trim();
    if line.is_empty() {
      continue;
    }

    if line == PACKAGE_MARKER {
      state.flush(&mut packages);
      state = ParseState::InRecord(PendingRecord::default());
      continue;
    }

    if line.starts_with('[') {
      // Any other table or array-of-tables header ends the package record;
      // its keys must not be merged into the package above it.
      state.flush(&mut packages);
      state = ParseState::AwaitingRecord;
      continue;
    }

    if let ParseState::InRecord(record) = &mut state
      && let Some((key, value)) = line.split_once('=')
    {
      record
        .fields
        .insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }
  }

  state.flush(&mut packages);
  LockSnapshot { packages }
}

/// Parse the lockfile at `path`.
///
/// A missing file is not an error: it yields an empty snapshot, which is the
/// normal state on a target's first run.
pub fn parse_packages(path: &Path) -> Result<LockSnapshot, LockError> {
  match fs::read_to_string(path) {
    Ok(content) => Ok(parse_str(&content)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LockSnapshot::new()),
    Err(source) => Err(LockError::Read {
      path: path.to_path_buf(),
      source,
    }),
  }
}

fn unquote(value: &str) -> &str {
  value
    .strip_prefix('"')
    .and_then(|v| v.strip_suffix('"'))
    .unwrap_or(value)
}
