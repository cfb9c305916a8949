//! Change computation between two lockfile snapshots.
//!
//! Classifies every package key as added, removed, or updated. Unchanged
//! packages are omitted. Each output list is sorted by `(name, source)` so
//! the summary is byte-reproducible regardless of map iteration order.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::lock::{LockSnapshot, PackageKey};

/// How a package changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Added,
  Removed,
  Updated,
}

/// One package-level change.
///
/// Invariants (upheld by the constructors):
/// - `Added` carries only `new_version`
/// - `Removed` carries only `old_version`
/// - `Updated` carries both, and they differ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageChange {
  pub key: PackageKey,
  pub kind: ChangeKind,
  pub old_version: Option<String>,
  pub new_version: Option<String>,
}

impl PackageChange {
  pub fn added(key: PackageKey, new_version: &str) -> Self {
    Self {
      key,
      kind: ChangeKind::Added,
      old_version: None,
      new_version: Some(new_version.to_string()),
    }
  }

  pub fn removed(key: PackageKey, old_version: &str) -> Self {
    Self {
      key,
      kind: ChangeKind::Removed,
      old_version: Some(old_version.to_string()),
      new_version: None,
    }
  }

  /// Returns `None` when the versions are equal, since that is not a change.
  pub fn updated(key: PackageKey, old_version: &str, new_version: &str) -> Option<Self> {
    (old_version != new_version).then(|| Self {
      key,
      kind: ChangeKind::Updated,
      old_version: Some(old_version.to_string()),
      new_version: Some(new_version.to_string()),
    })
  }

  pub fn name(&self) -> &str {
    &self.key.name
  }

  /// Source as shown in summaries: `"path"` for workspace-local packages.
  pub fn display_source(&self) -> &str {
    if self.key.is_path() { "path" } else { &self.key.source }
  }
}

impl Serialize for PackageChange {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let len = 3 + usize::from(self.old_version.is_some()) + usize::from(self.new_version.is_some());
    let mut state = serializer.serialize_struct("PackageChange", len)?;
    state.serialize_field("change", &self.kind)?;
    state.serialize_field("name", &self.key.name)?;
    if let Some(new) = &self.new_version {
      state.serialize_field("new", new)?;
    }
    if let Some(old) = &self.old_version {
      state.serialize_field("old", old)?;
    }
    state.serialize_field("source", self.display_source())?;
    state.end()
  }
}

/// Every change for one target, each list sorted by `(name, source)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
  pub added: Vec<PackageChange>,
  pub removed: Vec<PackageChange>,
  pub target: String,
  pub updated: Vec<PackageChange>,
}

impl TargetSummary {
  /// Returns true if nothing changed.
  pub fn is_empty(&self) -> bool {
    self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
  }

  pub fn change_count(&self) -> usize {
    self.added.len() + self.removed.len() + self.updated.len()
  }
}

/// Compare two snapshots of the same target.
///
/// - Key only in `new` → added
/// - Key in both with a different version → updated
/// - Key only in `old` → removed
pub fn diff(target: &str, old: &LockSnapshot, new: &LockSnapshot) -> TargetSummary {
  let mut added = Vec::new();
  let mut removed = Vec::new();
  let mut updated = Vec::new();

  for (key, new_version) in new {
    match old.get(key) {
      None => added.push(PackageChange::added(key.clone(), new_version)),
      Some(old_version) => updated.extend(PackageChange::updated(key.clone(), old_version, new_version)),
    }
  }

  for (key, old_version) in old {
    if !new.contains(key) {
      removed.push(PackageChange::removed(key.clone(), old_version));
    }
  }

  for list in [&mut added, &mut removed, &mut updated] {
    list.sort_by(|a, b| a.key.cmp(&b.key));
  }

  TargetSummary {
    added,
    removed,
    target: target.to_string(),
    updated,
  }
}
