use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn regenerate_first_run_writes_outputs() {
  let env = TestEnv::standard();
  env.resolver_returns(&[("serde", "1.0.228")]);

  env
    .chefsync_cmd()
    .arg("regenerate")
    .assert()
    .success()
    .stdout(predicate::str::contains("Regeneration complete"))
    .stdout(predicate::str::contains("serde 1.0.228"));

  let manifest = env.read_file("chef/backend/Cargo.toml");
  assert!(manifest.contains("\"backend\""));
  assert!(manifest.contains("\"shared\""));
  assert!(!manifest.contains("\"unused\""));

  assert!(env.path().join("chef/backend/Cargo.lock").exists());
  assert!(env.path().join("chef/frontend/Cargo.lock").exists());
  assert!(env.path().join("chef/checksums.json").exists());
  assert!(env.path().join("cargo-chef-summary.json").exists());
}

#[test]
fn regenerate_reports_updates_on_second_run() {
  let env = TestEnv::standard();
  env.resolver_returns(&[("serde", "1.0.228"), ("log", "0.4.22")]);
  env.chefsync_cmd().arg("regenerate").assert().success();

  env.resolver_returns(&[("serde", "1.0.229")]);
  env
    .chefsync_cmd()
    .arg("regenerate")
    .assert()
    .success()
    .stdout(predicate::str::contains("1.0.228 → 1.0.229"))
    .stdout(predicate::str::contains("log 0.4.22"));
}

#[test]
fn regenerate_summary_file_is_json() {
  let env = TestEnv::standard();
  env.resolver_returns(&[("serde", "1.0.228")]);

  env
    .chefsync_cmd()
    .args(["regenerate", "--summary-path", "out/summary.json", "--target", "backend"])
    .assert()
    .success();

  let summary: serde_json::Value = serde_json::from_str(&env.read_file("out/summary.json")).unwrap();
  let targets = summary.as_array().unwrap();
  assert_eq!(targets.len(), 1);
  assert_eq!(targets[0]["target"], "backend");
  assert_eq!(targets[0]["added"][0]["name"], "serde");
  assert_eq!(targets[0]["added"][0]["change"], "added");
  assert_eq!(targets[0]["added"][0]["new"], "1.0.228");
  assert!(!env.path().join("chef/frontend").exists());
}

#[test]
fn regenerate_json_output_is_valid() {
  let env = TestEnv::standard();
  env.resolver_returns(&[("serde", "1.0.228")]);

  let output = env
    .chefsync_cmd()
    .args(["regenerate", "--no-checksums", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["summaries"].as_array().unwrap().len(), 2);
  assert!(report["checksum_path"].is_null());
  assert!(!env.path().join("chef/checksums.json").exists());
}

#[test]
fn regenerate_unknown_target_fails() {
  let env = TestEnv::standard();
  env.resolver_returns(&[]);

  env
    .chefsync_cmd()
    .args(["regenerate", "--target", "mobile"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown target 'mobile'"));
}

#[test]
fn regenerate_missing_resolver_fails_before_writing() {
  let env = TestEnv::standard();
  env.write_file(
    "chefsync.toml",
    "output_dir = \"chef\"\n\n[resolver]\nprogram = \"chefsync-definitely-not-installed\"\n",
  );

  env
    .chefsync_cmd()
    .arg("regenerate")
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));

  assert!(!env.path().join("chef").exists());
}

#[test]
fn regenerate_resolver_failure_prints_resolver_output() {
  let env = TestEnv::standard();
  env.resolver_script("echo 'error: failed to select a version for serde' >&2; exit 101");

  env
    .chefsync_cmd()
    .arg("regenerate")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to select a version for serde"))
    .stderr(predicate::str::contains("exit code 101"));
}

#[test]
fn regenerate_missing_member_manifest_fails() {
  let env = TestEnv::standard();
  env.package("backend", r#"ghost = { path = "../ghost" }"#);
  env.resolver_returns(&[]);

  env
    .chefsync_cmd()
    .arg("regenerate")
    .assert()
    .failure()
    .stderr(predicate::str::contains("ghost"));
}

#[test]
fn regenerate_timeout_override() {
  let env = TestEnv::standard();
  env.resolver_script("sleep 10");

  env
    .chefsync_cmd()
    .args(["regenerate", "--timeout", "1s"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("timed out"));
}

#[test]
fn regenerate_timeout_keeps_fractional_seconds() {
  let env = TestEnv::standard();
  env.resolver_script("sleep 10");

  env
    .chefsync_cmd()
    .args(["regenerate", "--timeout", "500ms"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("timed out after 500ms"));
}
