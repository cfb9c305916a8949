//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const CRATES_IO: &str = "registry+https://github.com/rust-lang/crates.io-index";

/// Isolated test environment.
///
/// Each test gets its own temporary Cargo workspace plus a separate directory
/// for the lockfiles the fake resolver hands back.
pub struct TestEnv {
  pub temp: TempDir,
  pub locks: TempDir,
}

impl TestEnv {
  /// A workspace with `backend` and `frontend` targets sharing a `shared` crate,
  /// plus an `unused` member neither target depends on.
  pub fn standard() -> Self {
    let env = Self::with_members(&["backend", "frontend", "shared", "unused"]);
    env.package("backend", r#"shared = { path = "../shared" }"#);
    env.package("frontend", r#"shared = { path = "../shared" }"#);
    env.package("shared", "");
    env.package("unused", "");
    env
  }

  /// A workspace whose root manifest lists `members`.
  pub fn with_members(members: &[&str]) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
      locks: TempDir::new().unwrap(),
    };
    let list = members
      .iter()
      .map(|m| format!("\"{}\"", m))
      .collect::<Vec<_>>()
      .join(", ");
    env.write_file(
      "Cargo.toml",
      &format!("[workspace]\nresolver = \"2\"\nmembers = [{}]\n", list),
    );
    env
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the workspace root.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// Write a package manifest for `member` with the given `[dependencies]` body.
  pub fn package(&self, member: &str, deps: &str) {
    let name = member.rsplit('/').next().unwrap_or(member);
    self.write_file(
      &format!("{}/Cargo.toml", member),
      &format!(
        "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n{}\n",
        name, deps
      ),
    );
  }

  /// Configure a resolver that hands back a lockfile listing `packages`.
  pub fn resolver_returns(&self, packages: &[(&str, &str)]) {
    let lock = self.locks.path().join(format!("{}.lock", packages.len()));
    std::fs::write(&lock, lockfile(packages)).unwrap();
    self.resolver_script(&format!("cp '{}' Cargo.lock", lock.display()));
  }

  /// Configure a resolver that runs `script` with `/bin/sh` in the scratch tree.
  pub fn resolver_script(&self, script: &str) {
    self.write_file(
      "chefsync.toml",
      &format!(
        "output_dir = \"chef\"\n\n[resolver]\nprogram = \"/bin/sh\"\nargs = [\"-c\", {:?}]\ntimeout_secs = 30\n",
        script
      ),
    );
  }

  /// Get a pre-configured Command for the chefsync binary.
  ///
  /// Points it at this workspace through `CHEFSYNC_WORKSPACE` and runs it
  /// from the workspace root so relative outputs land there.
  pub fn chefsync_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("chefsync");
    cmd.env("CHEFSYNC_WORKSPACE", self.path());
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(self.path());
    cmd
  }
}

/// A lockfile with one registry package per `(name, version)` pair.
pub fn lockfile(packages: &[(&str, &str)]) -> String {
  let mut out = String::from("# This file is automatically @generated by Cargo.\nversion = 4\n");
  for (name, version) in packages {
    out.push_str(&format!(
      "\n[[package]]\nname = \"{}\"\nversion = \"{}\"\nsource = \"{}\"\n",
      name, version, CRATES_IO
    ));
  }
  out
}
