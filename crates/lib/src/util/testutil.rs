//! Test utilities for chefsync-lib.
//!
//! Provides a throwaway Cargo workspace on disk so tests can exercise the
//! member walker, manifest synthesizer, and regeneration pipeline against
//! real files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use crate::config::{Config, ResolverConfig, TargetConfig};

/// A Cargo workspace in a temporary directory.
pub struct TestWorkspace {
  pub temp: TempDir,
}

impl TestWorkspace {
  /// Create a workspace whose root manifest lists `members`.
  pub fn new(members: &[&str]) -> Self {
    let ws = Self {
      temp: TempDir::new().unwrap(),
    };
    let list = members
      .iter()
      .map(|m| format!("    \"{}\",", m))
      .collect::<Vec<_>>()
      .join("\n");
    ws.write_root_manifest(&format!(
      "[workspace]\nresolver = \"2\"\nmembers = [\n{}\n]\n\n[workspace.package]\nedition = \"2021\"\n",
      list
    ));
    ws
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the workspace root, creating parent directories.
  pub fn write(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  pub fn write_root_manifest(&self, content: &str) -> PathBuf {
    self.write("Cargo.toml", content)
  }

  /// Write a package manifest at `member` whose `[dependencies]` table holds `deps`.
  pub fn package(&self, member: &str, deps: &str) -> PathBuf {
    let name = member.rsplit('/').next().unwrap_or(member);
    self.write(
      &format!("{}/Cargo.toml", member),
      &format!(
        "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n{}\n",
        name, deps
      ),
    )
  }

  /// Default configuration rooted at this workspace.
  pub fn config(&self) -> Config {
    Config::default_for(self.temp.path()).unwrap()
  }

  /// Configuration with the given `(target, root member)` pairs and resolver.
  pub fn config_with(&self, targets: &[(&str, &str)], resolver: ResolverConfig) -> Config {
    let mut config = self.config();
    config.targets = targets
      .iter()
      .map(|(name, root)| (name.to_string(), TargetConfig::new(root)))
      .collect();
    config.resolver = resolver;
    config
  }
}

/// A resolver that runs a shell script in the scratch directory.
#[cfg(unix)]
pub fn shell_resolver(script: &str) -> ResolverConfig {
  ResolverConfig {
    program: "/bin/sh".to_string(),
    args: vec!["-c".to_string(), script.to_string()],
    timeout: Duration::from_secs(30),
  }
}

/// A lockfile with one registry package per `(name, version)` pair.
pub fn lockfile(packages: &[(&str, &str)]) -> String {
  let mut out = String::from("# This file is automatically @generated by Cargo.\nversion = 4\n");
  for (name, version) in packages {
    out.push_str(&format!(
      "\n[[package]]\nname = \"{}\"\nversion = \"{}\"\nsource = \"registry+https://github.com/rust-lang/crates.io-index\"\n",
      name, version
    ));
  }
  out
}
