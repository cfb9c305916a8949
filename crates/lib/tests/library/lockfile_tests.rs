//! Lockfile parsing and diffing through the public API.

use chefsync_lib::diff::{ChangeKind, diff};
use chefsync_lib::lock::{PackageKey, parse_packages, parse_str};

use super::common::Workspace;

const CRATES_IO: &str = "registry+https://github.com/rust-lang/crates.io-index";

const OLD_LOCK: &str = r#"# This file is automatically @generated by Cargo.
# It is not intended for manual editing.
version = 4

[[package]]
name = "backend"
version = "0.1.0"
dependencies = [
 "serde",
 "shared",
]

[[package]]
name = "serde"
version = "1.0.219"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "5f0e2c6ed6606019b4e29e69dbaba95b11854410e5347d525002456dbbb786b6"

[[package]]
name = "shared"
version = "0.1.0"

[[package]]
name = "time"
version = "0.3.36"
source = "registry+https://github.com/rust-lang/crates.io-index"
"#;

const NEW_LOCK: &str = r#"version = 4

[[package]]
name = "backend"
version = "0.1.0"

[[package]]
name = "serde"
version = "1.0.228"
source = "registry+https://github.com/rust-lang/crates.io-index"

[[package]]
name = "shared"
version = "0.2.0"

[[package]]
name = "tokio"
version = "1.47.1"
source = "registry+https://github.com/rust-lang/crates.io-index"
"#;

#[test]
fn lockfiles_on_disk_diff_into_sorted_changes() {
  let ws = Workspace::new(&[]);
  ws.write("old/Cargo.lock", OLD_LOCK);
  ws.write("new/Cargo.lock", NEW_LOCK);

  let old = parse_packages(&ws.path().join("old/Cargo.lock")).unwrap();
  let new = parse_packages(&ws.path().join("new/Cargo.lock")).unwrap();
  let summary = diff("backend", &old, &new);

  assert_eq!(summary.added.len(), 1);
  assert_eq!(summary.added[0].key, PackageKey::new("tokio", CRATES_IO));

  assert_eq!(summary.removed.len(), 1);
  assert_eq!(summary.removed[0].name(), "time");

  let updated: Vec<&str> = summary.updated.iter().map(|c| c.name()).collect();
  assert_eq!(updated, vec!["serde", "shared"]);
  assert!(summary.updated.iter().all(|c| c.kind == ChangeKind::Updated));
  assert_eq!(summary.updated[1].display_source(), "path");
}

#[test]
fn first_run_treats_missing_lock_as_empty() {
  let ws = Workspace::new(&[]);

  let old = parse_packages(&ws.path().join("never-written/Cargo.lock")).unwrap();
  let summary = diff("backend", &old, &parse_str(NEW_LOCK));

  assert_eq!(summary.added.len(), 4);
  assert!(summary.removed.is_empty());
  assert!(summary.updated.is_empty());
}

#[test]
fn self_diff_is_empty() {
  let snapshot = parse_str(OLD_LOCK);
  assert!(diff("backend", &snapshot, &snapshot).is_empty());
}
