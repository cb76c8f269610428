use predicates::prelude::*;

use super::common::TestEnv;

const UNFORMATTED: &str = r#"
[native]
profile="classic"

[package]
version   = "0.1.0"
name = "photo-turntable"
source = "app"
"#;

#[test]
fn check_fails_on_unformatted_descriptor() {
  let env = TestEnv::unlocked();
  env.write_file("ptpack.toml", UNFORMATTED);

  env
    .ptpack_cmd()
    .args(["fmt", "--check"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not formatted"));

  assert_eq!(env.descriptor(), UNFORMATTED);
}

#[test]
fn fmt_rewrites_then_check_passes() {
  let env = TestEnv::unlocked();
  env.write_file("ptpack.toml", UNFORMATTED);

  env
    .ptpack_cmd()
    .arg("fmt")
    .assert()
    .success()
    .stdout(predicate::str::contains("formatted"));

  assert!(env.descriptor().starts_with("[package]"));

  env
    .ptpack_cmd()
    .args(["fmt", "--check"])
    .assert()
    .success()
    .stdout(predicate::str::contains("is formatted"));
}

#[test]
fn fmt_rejects_unknown_keys() {
  let env = TestEnv::unlocked();
  env.write_file("ptpack.toml", &(env.descriptor() + "\n[flake]\ninputs = []\n"));

  env
    .ptpack_cmd()
    .arg("fmt")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn explicit_descriptor_path() {
  let env = TestEnv::unlocked();
  env.write_file("nested/custom.toml", UNFORMATTED);

  env
    .ptpack_cmd()
    .args(["fmt", "--check", "-f"])
    .arg(env.path().join("nested/custom.toml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("custom.toml"));
}

#[test]
fn fmt_keeps_comments() {
  let env = TestEnv::unlocked();
  env.write_file(
    "ptpack.toml",
    "[native]\n# cmake revision\nprofile = \"cmake\"\n\n# packaging for the turntable app\n[package]\nversion = \"0.1.0\"\nname = \"photo-turntable\"\nsource = \"app\" # relative to this file\n",
  );

  env.ptpack_cmd().arg("fmt").assert().success();

  assert_eq!(
    env.descriptor(),
    "# packaging for the turntable app\n[package]\nname = \"photo-turntable\"\nversion = \"0.1.0\"\nsource = \"app\" # relative to this file\n\n[native]\n# cmake revision\nprofile = \"cmake\"\n"
  );
}
