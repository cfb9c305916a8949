//! Filesystem helpers shared by the synthesizer, the resolver, and output writers.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Write `contents` to `path` atomically.
///
/// Parent directories are created as needed. The content is written to a
/// sibling `*.tmp` file which is then renamed over the destination, so an
/// interrupted run never leaves a half-written file behind.
pub fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)?;
  }

  let mut temp_name = path
    .file_name()
    .map(OsString::from)
    .unwrap_or_else(|| OsString::from("out"));
  temp_name.push(".tmp");
  let temp_path = path.with_file_name(temp_name);

  fs::write(&temp_path, contents)?;
  fs::rename(&temp_path, path)
}

/// Lexically normalize a path, resolving `.` and `..` without touching the filesystem.
///
/// Used as a fallback when a dependency path does not exist yet and therefore
/// cannot be canonicalized.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let ends_with_parent = matches!(out.components().next_back(), Some(Component::ParentDir));
        if ends_with_parent || out.as_os_str().is_empty() {
          out.push("..");
        } else {
          // `/..` stays `/`
          out.pop();
        }
      }
      other => out.push(other),
    }
  }
  out
}

/// Express `path` as a `/`-separated identifier relative to `root`.
///
/// Returns `None` if `path` is not inside `root`. The root itself maps to `"."`.
pub fn relative_id(path: &Path, root: &Path) -> Option<String> {
  let rel = path.strip_prefix(root).ok()?;
  let parts: Vec<String> = rel
    .components()
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      _ => None,
    })
    .collect();

  if parts.is_empty() {
    Some(".".to_string())
  } else {
    Some(parts.join("/"))
  }
}
