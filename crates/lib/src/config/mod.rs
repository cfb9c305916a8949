//! Run configuration.
//!
//! The workspace root, output directory, target table, and resolver command
//! are process-wide settings. They are loaded once into a [`Config`] value and
//! passed explicitly into every component.
//!
//! # Config File Format
//!
//! ```toml
//! output_dir = "docker/build-tools/cargo-chef"
//!
//! [targets.backend]
//! root = "backend"
//! binary = true
//!
//! [resolver]
//! program = "cargo"
//! args = ["generate-lockfile", "--manifest-path", "{manifest}"]
//! timeout_secs = 600
//!
//! [checksums]
//! path = "checksums.json"
//! files = ["Cargo.toml", "backend/Cargo.toml"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  CONFIG_FILENAME, DEFAULT_CHECKSUM_FILENAME, DEFAULT_OUTPUT_DIR, DEFAULT_RESOLVER_TIMEOUT_SECS, LOCK_FILENAME,
  MANIFEST_FILENAME,
};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The workspace directory does not exist.
  #[error("workspace root not found: {}", path.display())]
  WorkspaceNotFound {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to read the config file.
  #[error("failed to read config file {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to parse the config file.
  #[error("failed to parse config file {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// A target was requested that is not configured.
  #[error("unknown target '{name}' (configured: {known})")]
  UnknownTarget { name: String, known: String },
}

/// A deployable target whose dependency subset is cached independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
  /// Workspace-relative path of the target's root package.
  pub root: String,

  /// Whether the root package produces an executable and needs a `main.rs` placeholder.
  #[serde(default = "default_true")]
  pub binary: bool,
}

impl TargetConfig {
  pub fn new(root: &str) -> Self {
    Self {
      root: root.to_string(),
      binary: true,
    }
  }
}

/// The external lockfile generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
  /// Executable name or path, looked up on `PATH`.
  #[serde(default = "default_resolver_program")]
  pub program: String,

  /// Arguments. `{manifest}` and `{scratch}` are substituted per target.
  #[serde(default = "default_resolver_args")]
  pub args: Vec<String>,

  /// Time before the resolver is killed, written as whole seconds in the config file.
  #[serde(rename = "timeout_secs", default = "default_timeout", deserialize_with = "deserialize_secs")]
  pub timeout: Duration,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self {
      program: default_resolver_program(),
      args: default_resolver_args(),
      timeout: default_timeout(),
    }
  }
}

/// Where and what to checksum after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecksumConfig {
  /// Output path, relative to the output directory.
  #[serde(default)]
  pub path: Option<PathBuf>,

  /// Workspace-relative files to hash. When empty, the root manifest and
  /// every member manifest of the processed targets are hashed.
  #[serde(default)]
  pub files: Vec<String>,
}

/// On-disk shape of `chefsync.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
  #[serde(default)]
  output_dir: Option<PathBuf>,
  #[serde(default)]
  targets: BTreeMap<String, TargetConfig>,
  #[serde(default)]
  resolver: Option<ResolverConfig>,
  #[serde(default)]
  checksums: ChecksumConfig,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Canonical workspace root.
  pub workspace_root: PathBuf,
  /// Absolute directory holding one subdirectory per target.
  pub output_dir: PathBuf,
  /// Targets, processed in name order.
  pub targets: BTreeMap<String, TargetConfig>,
  pub resolver: ResolverConfig,
  pub checksums: ChecksumConfig,
}

impl Config {
  /// Configuration for the conventional layout: `backend` and `frontend`
  /// targets rooted at same-named members.
  pub fn default_for(workspace_root: &Path) -> Result<Self, ConfigError> {
    let workspace_root = canonical_root(workspace_root)?;
    let targets = BTreeMap::from([
      ("backend".to_string(), TargetConfig::new("backend")),
      ("frontend".to_string(), TargetConfig::new("frontend")),
    ]);

    Ok(Self {
      output_dir: workspace_root.join(DEFAULT_OUTPUT_DIR),
      workspace_root,
      targets,
      resolver: ResolverConfig::default(),
      checksums: ChecksumConfig::default(),
    })
  }

  /// Load configuration for `workspace_root`.
  ///
  /// Uses `explicit` if given, otherwise `chefsync.toml` at the workspace root
  /// if present, otherwise [`Config::default_for`].
  pub fn load(workspace_root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let workspace_root = canonical_root(workspace_root)?;

    let path = match explicit {
      Some(path) => path.to_path_buf(),
      None => {
        let candidate = workspace_root.join(CONFIG_FILENAME);
        if !candidate.exists() {
          debug!(workspace = %workspace_root.display(), "no config file, using default layout");
          return Self::default_for(&workspace_root);
        }
        candidate
      }
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
      path: path.clone(),
      source,
    })?;
    let mut config = Self::from_toml_str(&workspace_root, &content).map_err(|source| ConfigError::Parse {
      path: path.clone(),
      source,
    })?;

    if config.targets.is_empty() {
      let defaults = Self::default_for(&workspace_root)?;
      config.targets = defaults.targets;
    }

    debug!(config = %path.display(), targets = config.targets.len(), "loaded config");
    Ok(config)
  }

  /// Parse config file content. `workspace_root` must already be canonical.
  pub fn from_toml_str(workspace_root: &Path, content: &str) -> Result<Self, toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;

    let output_dir = file.output_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let output_dir = if output_dir.is_absolute() {
      output_dir
    } else {
      workspace_root.join(output_dir)
    };

    Ok(Self {
      workspace_root: workspace_root.to_path_buf(),
      output_dir,
      targets: file.targets,
      resolver: file.resolver.unwrap_or_default(),
      checksums: file.checksums,
    })
  }

  /// Look up a configured target.
  pub fn target(&self, name: &str) -> Result<&TargetConfig, ConfigError> {
    self.targets.get(name).ok_or_else(|| ConfigError::UnknownTarget {
      name: name.to_string(),
      known: self.targets.keys().cloned().collect::<Vec<_>>().join(", "),
    })
  }

  /// Path of the real root workspace manifest.
  pub fn root_manifest_path(&self) -> PathBuf {
    self.workspace_root.join(MANIFEST_FILENAME)
  }

  /// Path of a member's real manifest.
  pub fn member_manifest_path(&self, member: &str) -> PathBuf {
    self.workspace_root.join(member).join(MANIFEST_FILENAME)
  }

  /// Directory holding a target's generated manifest and lockfile.
  pub fn target_dir(&self, target: &str) -> PathBuf {
    self.output_dir.join(target)
  }

  pub fn target_manifest_path(&self, target: &str) -> PathBuf {
    self.target_dir(target).join(MANIFEST_FILENAME)
  }

  pub fn target_lock_path(&self, target: &str) -> PathBuf {
    self.target_dir(target).join(LOCK_FILENAME)
  }

  pub fn checksum_path(&self) -> PathBuf {
    let rel = self
      .checksums
      .path
      .clone()
      .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKSUM_FILENAME));
    if rel.is_absolute() { rel } else { self.output_dir.join(rel) }
  }
}

fn canonical_root(path: &Path) -> Result<PathBuf, ConfigError> {
  dunce::canonicalize(path).map_err(|source| ConfigError::WorkspaceNotFound {
    path: path.to_path_buf(),
    source,
  })
}

fn default_true() -> bool {
  true
}

fn default_resolver_program() -> String {
  "cargo".to_string()
}

fn default_resolver_args() -> Vec<String> {
  ["generate-lockfile", "--manifest-path", "{manifest}"]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timeout() -> Duration {
  Duration::from_secs(DEFAULT_RESOLVER_TIMEOUT_SECS)
}

fn deserialize_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
  D: serde::Deserializer<'de>,
{
  u64::deserialize(deserializer).map(Duration::from_secs)
}
