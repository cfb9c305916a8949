//! Member discovery and manifest synthesis through the public API.

use chefsync_lib::manifest::{render_manifest, write_manifest};
use chefsync_lib::members::{GraphError, resolve_members};

use super::common::Workspace;

/// backend -> shared -> util, with dev, build, and target-specific edges.
fn layered() -> Workspace {
  let ws = Workspace::new(&["backend", "frontend", "shared", "util", "testkit", "codegen", "winapi-shim"]);
  ws.package(
    "backend",
    r#"[dependencies]
shared = { path = "../shared" }
serde = "1.0"

[dev-dependencies]
testkit = { path = "../testkit" }

[build-dependencies]
codegen = { path = "../codegen" }

[target.'cfg(windows)'.dependencies]
winapi-shim = { path = "../winapi-shim" }"#,
  );
  ws.package("frontend", "");
  ws.package("shared", "[dependencies]\nutil = { path = \"../util\" }");
  ws.package("util", "");
  ws.package("testkit", "[dependencies]\nshared = { path = \"../shared\" }");
  ws.package("codegen", "");
  ws.package("winapi-shim", "");
  ws
}

#[test]
fn target_members_are_transitively_reachable_and_unique() {
  let ws = layered();

  let members = resolve_members(&ws.config(), "backend").unwrap();

  let mut sorted: Vec<&str> = members.iter().collect();
  sorted.sort();
  assert_eq!(sorted, vec!["backend", "codegen", "shared", "testkit", "util", "winapi-shim"]);
  assert_eq!(members.iter().next(), Some("backend"));
  assert!(!members.contains("frontend"));
}

#[test]
fn traversal_order_is_stable_across_runs() {
  let ws = layered();
  let config = ws.config();

  let first = resolve_members(&config, "backend").unwrap();
  let second = resolve_members(&config, "backend").unwrap();

  assert_eq!(first, second);
}

#[test]
fn dependency_cycles_terminate() {
  let ws = Workspace::new(&["a", "b", "c"]);
  ws.package("a", "[dependencies]\nb = { path = \"../b\" }");
  ws.package("b", "[dependencies]\nc = { path = \"../c\" }");
  ws.package("c", "[dependencies]\na = { path = \"../a\" }");

  let members = resolve_members(&ws.config(), "a").unwrap();

  assert_eq!(members.as_slice(), ["a", "b", "c"]);
}

#[test]
fn paths_outside_the_workspace_are_ignored() {
  let outside = tempfile::TempDir::new().unwrap();
  std::fs::write(
    outside.path().join("Cargo.toml"),
    "[package]\nname = \"vendored\"\nversion = \"0.1.0\"\n",
  )
  .unwrap();

  let ws = Workspace::new(&["app"]);
  ws.package(
    "app",
    &format!("[dependencies]\nvendored = {{ path = {:?} }}", outside.path().display().to_string()),
  );

  let members = resolve_members(&ws.config(), "app").unwrap();

  assert_eq!(members.as_slice(), ["app"]);
}

#[test]
fn missing_dependency_manifest_is_an_error() {
  let ws = Workspace::new(&["app"]);
  ws.package("app", "[dependencies]\nghost = { path = \"../ghost\" }");

  let err = resolve_members(&ws.config(), "app").unwrap_err();

  assert!(matches!(err, GraphError::MissingManifest { ref member, .. } if member == "ghost"));
}

#[test]
fn synthesized_manifest_lists_exactly_the_members() {
  let ws = layered();
  let config = ws.config();
  let members = resolve_members(&config, "backend").unwrap();

  let text = write_manifest(&config, "backend", &members).unwrap();

  for member in &members {
    assert!(text.contains(&format!("\"{}\"", member)));
  }
  assert!(!text.contains("\"frontend\""));
  assert_eq!(std::fs::read_to_string(config.target_manifest_path("backend")).unwrap(), text);

  let root = std::fs::read_to_string(ws.path().join("Cargo.toml")).unwrap();
  assert_eq!(render_manifest(&root, &members).unwrap(), text);
}
