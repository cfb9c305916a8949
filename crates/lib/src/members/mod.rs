//! Workspace member discovery.
//!
//! Given a target's root package, walks the workspace's internal package
//! graph through path dependencies to find every local package the target's
//! synthetic workspace must include.
//!
//! # Algorithm Overview
//!
//! 1. Seed an explicit stack with the root member
//! 2. Pop a member; skip it if already visited, otherwise record it
//! 3. Read its manifest and collect every path dependency from the
//!    `dependencies`, `dev-dependencies`, and `build-dependencies` tables,
//!    including their `target.<cfg>` variants
//! 4. Resolve each path relative to the member and keep it only if it lies
//!    inside the workspace root
//! 5. Push the discovered members (sorted, so traversal is deterministic)
//!
//! The `visited` set guarantees termination when two local packages depend
//! on each other.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use toml::{Table, Value};
use tracing::{debug, trace};

use crate::config::Config;
use crate::util::{normalize_path, relative_id};

/// Dependency tables that may contain path dependencies.
///
/// Cargo still accepts the underscore spellings, so they are scanned too.
const DEPENDENCY_TABLES: &[&str] = &[
  "dependencies",
  "dev-dependencies",
  "dev_dependencies",
  "build-dependencies",
  "build_dependencies",
];

/// Errors that can occur while walking the member graph.
#[derive(Debug, Error)]
pub enum GraphError {
  /// A discovered member has no manifest.
  #[error("missing manifest for workspace member '{member}' at {}", path.display())]
  MissingManifest { member: String, path: PathBuf },

  /// A manifest exists but could not be read.
  #[error("failed to read manifest {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// A manifest is not valid TOML.
  #[error("failed to parse manifest {}: {source}", path.display())]
  ManifestParse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// The requested root package lies outside the workspace.
  #[error("package '{member}' is outside the workspace root")]
  OutsideWorkspace { member: String },
}

/// Ordered, duplicate-free list of workspace-relative member identifiers.
///
/// Order is traversal order. It carries no meaning beyond being stable for a
/// given workspace, which keeps the generated manifest text reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MemberSet(Vec<String>);

impl MemberSet {
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn contains(&self, member: &str) -> bool {
    self.0.iter().any(|m| m == member)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }
}

impl From<Vec<String>> for MemberSet {
  /// Build a member set, dropping repeated entries while keeping first-seen order.
  fn from(members: Vec<String>) -> Self {
    let mut seen = HashSet::new();
    Self(members.into_iter().filter(|m| seen.insert(m.clone())).collect())
  }
}

impl<'a> IntoIterator for &'a MemberSet {
  type Item = &'a String;
  type IntoIter = std::slice::Iter<'a, String>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

/// Walks path dependencies inside one workspace.
#[derive(Debug)]
pub struct MemberWalker<'a> {
  config: &'a Config,
  /// `[workspace.dependencies]` entries that carry a path, resolved against the workspace root.
  workspace_paths: BTreeMap<String, PathBuf>,
}

impl<'a> MemberWalker<'a> {
  /// Create a walker, reading `[workspace.dependencies]` from the root manifest if it exists.
  pub fn new(config: &'a Config) -> Result<Self, GraphError> {
    let root_manifest = config.root_manifest_path();
    let mut workspace_paths = BTreeMap::new();

    if root_manifest.exists() {
      let table = read_manifest(&root_manifest)?;
      if let Some(deps) = table
        .get("workspace")
        .and_then(Value::as_table)
        .and_then(|ws| ws.get("dependencies"))
        .and_then(Value::as_table)
      {
        for (name, spec) in deps {
          if let Some(path) = spec.get("path").and_then(Value::as_str) {
            workspace_paths.insert(name.clone(), config.workspace_root.join(path));
          }
        }
      }
    }

    Ok(Self {
      config,
      workspace_paths,
    })
  }

  /// Discover `root` and every local package it reaches through path dependencies.
  pub fn resolve(&self, root: &str) -> Result<MemberSet, GraphError> {
    let root_id = relative_id(&normalize_path(&self.config.workspace_root.join(root)), &self.config.workspace_root)
      .ok_or_else(|| GraphError::OutsideWorkspace {
        member: root.to_string(),
      })?;

    let mut stack = vec![root_id];
    let mut visited = HashSet::new();
    let mut ordered = Vec::new();

    while let Some(member) = stack.pop() {
      if !visited.insert(member.clone()) {
        continue;
      }

      let manifest = self.config.member_manifest_path(&member);
      if !manifest.exists() {
        return Err(GraphError::MissingManifest { member, path: manifest });
      }

      let deps = self.path_dependencies(&manifest)?;
      trace!(member = %member, count = deps.len(), "scanned member manifest");
      ordered.push(member);

      // Reverse so the lexically smallest dependency is popped first.
      stack.extend(deps.into_iter().rev());
    }

    debug!(root = %root, members = ordered.len(), "resolved workspace members");
    Ok(MemberSet(ordered))
  }

  /// Collect the workspace-relative ids of every local path dependency declared in `manifest_path`.
  pub fn path_dependencies(&self, manifest_path: &Path) -> Result<BTreeSet<String>, GraphError> {
    let table = read_manifest(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or(Path::new("."));

    let mut discovered = BTreeSet::new();
    for (name, spec) in dependency_entries(&table) {
      let Some(candidate) = self.dependency_path(name, spec, base_dir) else {
        continue;
      };

      let resolved = dunce::canonicalize(&candidate).unwrap_or_else(|_| normalize_path(&candidate));
      match relative_id(&resolved, &self.config.workspace_root) {
        Some(id) => {
          debug!(dependency = %name, member = %id, "found local path dependency");
          discovered.insert(id);
        }
        None => {
          debug!(dependency = %name, path = %resolved.display(), "ignoring path dependency outside workspace");
        }
      }
    }

    Ok(discovered)
  }

  /// Location of a dependency if it is path-based, either directly or via workspace inheritance.
  fn dependency_path(&self, name: &str, spec: &Value, base_dir: &Path) -> Option<PathBuf> {
    let spec = spec.as_table()?;
    if let Some(path) = spec.get("path").and_then(Value::as_str) {
      return Some(base_dir.join(path));
    }
    if spec.get("workspace").and_then(Value::as_bool) == Some(true) {
      return self.workspace_paths.get(name).cloned();
    }
    None
  }
}

/// Discover the member set for `root` in the workspace described by `config`.
pub fn resolve_members(config: &Config, root: &str) -> Result<MemberSet, GraphError> {
  MemberWalker::new(config)?.resolve(root)
}

/// Collect the local path dependencies declared by a single manifest.
pub fn find_path_dependencies(config: &Config, manifest_path: &Path) -> Result<BTreeSet<String>, GraphError> {
  MemberWalker::new(config)?.path_dependencies(manifest_path)
}

fn read_manifest(path: &Path) -> Result<Table, GraphError> {
  let content = fs::read_to_string(path).map_err(|source| GraphError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  toml::from_str(&content).map_err(|source| GraphError::ManifestParse {
    path: path.to_path_buf(),
    source,
  })
}

/// Every `(name, spec)` pair from the top-level and platform-conditional dependency tables.
fn dependency_entries(manifest: &Table) -> Vec<(&str, &Value)> {
  let mut sections: Vec<&Table> = DEPENDENCY_TABLES
    .iter()
    .filter_map(|key| manifest.get(*key).and_then(Value::as_table))
    .collect();

  if let Some(targets) = manifest.get("target").and_then(Value::as_table) {
    for platform in targets.values().filter_map(Value::as_table) {
      sections.extend(
        DEPENDENCY_TABLES
          .iter()
          .filter_map(|key| platform.get(*key).and_then(Value::as_table)),
      );
    }
  }

  sections
    .into_iter()
    .flat_map(|section| section.iter().map(|(name, spec)| (name.as_str(), spec)))
    .collect()
}
