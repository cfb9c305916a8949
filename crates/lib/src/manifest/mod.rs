//! Synthetic workspace manifest generation.
//!
//! Each target gets a copy of the real root `Cargo.toml` whose
//! `workspace.members` lists exactly the target's member set. The manifest is
//! edited structurally with `toml_edit`, so comments, key order, and the rest
//! of the formatting survive the rewrite.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use toml_edit::{Array, DocumentMut, Item, TableLike};
use tracing::{debug, info};

use crate::config::Config;
use crate::members::MemberSet;
use crate::util::write_atomic;

const MEMBER_INDENT: &str = "    ";

/// Errors that can occur when generating a target manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// The root manifest could not be read.
  #[error("failed to read root manifest {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The root manifest is not valid TOML.
  #[error("failed to parse root manifest: {0}")]
  Parse(#[from] toml_edit::TomlError),

  /// The root manifest has no `[workspace]` table.
  #[error("cannot locate [workspace] section in root manifest")]
  MissingWorkspace,

  /// The `[workspace]` table has no `members` array.
  #[error("cannot locate workspace members array in root manifest")]
  MissingMembers,

  /// The generated manifest could not be written.
  #[error("failed to write manifest {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Rewrite `workspace.members` in `root_manifest` to list exactly `members`.
///
/// Entries of `workspace.default-members` that are no longer members are
/// dropped (and the key removed if none remain) so Cargo still accepts the
/// manifest. Rendering is a pure function of its inputs.
pub fn render_manifest(root_manifest: &str, members: &MemberSet) -> Result<String, ManifestError> {
  let mut doc: DocumentMut = root_manifest.parse()?;

  let workspace = doc
    .get_mut("workspace")
    .and_then(Item::as_table_like_mut)
    .ok_or(ManifestError::MissingWorkspace)?;

  // Entries are indented relative to the `members` line itself.
  let indent = workspace
    .key("members")
    .and_then(|key| key.leaf_decor().prefix())
    .and_then(|prefix| prefix.as_str())
    .and_then(|prefix| prefix.rsplit('\n').next())
    .unwrap_or_default()
    .to_string();

  let value = workspace
    .get_mut("members")
    .and_then(Item::as_value_mut)
    .filter(|v| v.is_array())
    .ok_or(ManifestError::MissingMembers)?;

  let decor = value.decor().clone();
  *value = members_array(members, &indent).into();
  *value.decor_mut() = decor;

  prune_default_members(workspace, members);

  Ok(doc.to_string())
}

/// Read and validate the real root manifest.
///
/// Run before any target is processed so a malformed root manifest aborts
/// the whole run up front.
pub fn load_root_manifest(config: &Config) -> Result<String, ManifestError> {
  let path = config.root_manifest_path();
  let content = fs::read_to_string(&path).map_err(|source| ManifestError::Read { path, source })?;
  render_manifest(&content, &MemberSet::default())?;
  Ok(content)
}

/// Generate and write the manifest for `target`.
///
/// The manifest is written to `<output_dir>/<target>/Cargo.toml`; its text is returned.
pub fn write_manifest(config: &Config, target: &str, members: &MemberSet) -> Result<String, ManifestError> {
  let root_manifest = load_root_manifest(config)?;
  let rendered = render_manifest(&root_manifest, members)?;

  let path = config.target_manifest_path(target);
  write_atomic(&path, &rendered).map_err(|source| ManifestError::Write {
    path: path.clone(),
    source,
  })?;

  info!(target = %target, members = members.len(), path = %path.display(), "wrote target manifest");
  Ok(rendered)
}

fn members_array(members: &MemberSet, indent: &str) -> Array {
  let mut array = Array::new();
  for member in members {
    array.push(member.as_str());
  }
  if !array.is_empty() {
    for value in array.iter_mut() {
      value.decor_mut().set_prefix(format!("\n{}{}", indent, MEMBER_INDENT));
      value.decor_mut().set_suffix("");
    }
    array.set_trailing(format!("\n{}", indent));
    array.set_trailing_comma(false);
  }
  array
}

fn prune_default_members(workspace: &mut dyn TableLike, members: &MemberSet) {
  let Some(defaults) = workspace.get_mut("default-members").and_then(Item::as_array_mut) else {
    return;
  };

  let before = defaults.len();
  defaults.retain(|v| v.as_str().is_some_and(|m| members.contains(m)));
  if defaults.len() != before {
    debug!(dropped = before - defaults.len(), "pruned default-members");
  }

  if defaults.is_empty() {
    workspace.remove("default-members");
  }
}
