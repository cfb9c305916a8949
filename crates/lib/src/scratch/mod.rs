//! Scratch tree materialization.
//!
//! The resolver only needs manifests to compute a lockfile, not real source
//! code. For each member this module copies the manifest (and build script)
//! into an isolated directory and writes the smallest placeholder sources
//! that make Cargo accept the package as a library and/or binary target.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};
use tracing::{debug, trace};

use crate::config::Config;
use crate::consts::{BIN_PLACEHOLDER, BUILD_SCRIPT_FILENAME, LIB_PLACEHOLDER, MANIFEST_FILENAME};
use crate::members::MemberSet;

/// Member id of a package at the workspace root.
const ROOT_MEMBER: &str = ".";

/// Errors that can occur while materializing a scratch tree.
#[derive(Debug, Error)]
pub enum ScratchError {
  /// A member has no manifest to copy.
  #[error("missing manifest for workspace member '{member}'")]
  MissingManifest { member: String },

  /// A member manifest is not valid TOML.
  #[error("failed to parse manifest {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// A filesystem operation failed.
  #[error("scratch tree I/O failed at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Which placeholder sources a member needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
  /// Library source path relative to the member, always present.
  pub lib: PathBuf,
  /// Binary source paths relative to the member.
  pub bins: Vec<PathBuf>,
}

impl Placeholders {
  /// Decide placeholders from a parsed manifest.
  ///
  /// `designated_binary` is set for a target's root package when the target
  /// is configured to produce an executable.
  pub fn for_manifest(manifest: &Table, designated_binary: bool) -> Self {
    let lib = manifest
      .get("lib")
      .and_then(|lib| lib.get("path"))
      .and_then(Value::as_str)
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from("src/lib.rs"));

    let declared: Vec<&Value> = manifest
      .get("bin")
      .and_then(Value::as_array)
      .map(|bins| bins.iter().collect())
      .unwrap_or_default();

    let mut bins = Vec::new();
    if designated_binary || !declared.is_empty() {
      bins.push(PathBuf::from("src/main.rs"));
    }
    let package_name = manifest
      .get("package")
      .and_then(|p| p.get("name"))
      .and_then(Value::as_str);
    for bin in declared {
      let path = match (bin.get("path").and_then(Value::as_str), bin.get("name").and_then(Value::as_str)) {
        (Some(path), _) => PathBuf::from(path),
        // Cargo looks for a pathless bin at src/main.rs only when it shares the package name.
        (None, Some(name)) if Some(name) != package_name => PathBuf::from(format!("src/bin/{}.rs", name)),
        (None, _) => continue,
      };
      if !bins.contains(&path) {
        bins.push(path);
      }
    }

    Self { lib, bins }
  }
}

/// Copy every member's manifest into `scratch_root` and write placeholder sources.
///
/// The target's root member gets a binary placeholder when the target is
/// configured with `binary = true`; other members only when their manifest
/// declares `[[bin]]` targets.
pub fn materialize_scratch_tree(
  config: &Config,
  scratch_root: &Path,
  target: &str,
  members: &MemberSet,
) -> Result<(), ScratchError> {
  let designated_root = config
    .targets
    .get(target)
    .filter(|t| t.binary)
    .map(|t| crate::util::normalize_path(Path::new(&t.root)))
    .map(|root| if root.as_os_str().is_empty() { PathBuf::from(ROOT_MEMBER) } else { root });

  for member in members {
    let designated = designated_root.as_deref() == Some(Path::new(member));
    copy_member(config, scratch_root, member, designated)?;
  }

  debug!(target = %target, scratch = %scratch_root.display(), members = members.len(), "materialized scratch tree");
  Ok(())
}

fn copy_member(config: &Config, scratch_root: &Path, member: &str, designated_binary: bool) -> Result<(), ScratchError> {
  let src_dir = config.workspace_root.join(member);
  let src_manifest = src_dir.join(MANIFEST_FILENAME);
  if !src_manifest.exists() {
    return Err(ScratchError::MissingManifest {
      member: member.to_string(),
    });
  }

  let dest_dir = scratch_root.join(member);
  create_dir(&dest_dir)?;
  // The root package lives in the synthetic manifest already written at the scratch root.
  if member != ROOT_MEMBER {
    copy_file(&src_manifest, &dest_dir.join(MANIFEST_FILENAME))?;
  }

  let content = fs::read_to_string(&src_manifest).map_err(|source| ScratchError::Io {
    path: src_manifest.clone(),
    source,
  })?;
  let manifest: Table = toml::from_str(&content).map_err(|source| ScratchError::Parse {
    path: src_manifest.clone(),
    source,
  })?;

  let build_script = manifest
    .get("package")
    .and_then(|p| p.get("build"))
    .and_then(Value::as_str)
    .unwrap_or(BUILD_SCRIPT_FILENAME);
  let src_build = src_dir.join(build_script);
  if src_build.is_file() {
    copy_file(&src_build, &dest_dir.join(build_script))?;
  }

  let placeholders = Placeholders::for_manifest(&manifest, designated_binary);
  write_placeholder(&dest_dir.join(&placeholders.lib), LIB_PLACEHOLDER)?;
  for bin in &placeholders.bins {
    write_placeholder(&dest_dir.join(bin), BIN_PLACEHOLDER)?;
  }

  trace!(member = %member, bins = placeholders.bins.len(), "copied member into scratch tree");
  Ok(())
}

/// Write a placeholder unless a file is already there.
fn write_placeholder(path: &Path, content: &str) -> Result<(), ScratchError> {
  if path.exists() {
    return Ok(());
  }
  if let Some(parent) = path.parent() {
    create_dir(parent)?;
  }
  fs::write(path, content).map_err(|source| ScratchError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn create_dir(path: &Path) -> Result<(), ScratchError> {
  fs::create_dir_all(path).map_err(|source| ScratchError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn copy_file(from: &Path, to: &Path) -> Result<(), ScratchError> {
  if let Some(parent) = to.parent() {
    create_dir(parent)?;
  }
  fs::copy(from, to).map(|_| ()).map_err(|source| ScratchError::Io {
    path: from.to_path_buf(),
    source,
  })
}
