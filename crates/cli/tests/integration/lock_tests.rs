use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn lock_records_hash_in_descriptor() {
  let env = TestEnv::unlocked();
  assert!(!env.descriptor().contains("lock_hash"));

  env
    .ptpack_cmd()
    .arg("lock")
    .assert()
    .success()
    .stdout(predicate::str::contains("recorded lock hash sha256:"));

  assert!(env.descriptor().contains("lock_hash = \"sha256:"));
}

#[test]
fn lock_is_idempotent() {
  let env = TestEnv::locked();
  let before = env.descriptor();

  env
    .ptpack_cmd()
    .arg("lock")
    .assert()
    .success()
    .stdout(predicate::str::contains("up to date"));

  assert_eq!(env.descriptor(), before);
}

#[test]
fn lock_requires_cargo_lock() {
  let env = TestEnv::unlocked();
  std::fs::remove_file(env.path().join("app/Cargo.lock")).unwrap();

  env
    .ptpack_cmd()
    .arg("lock")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Cargo.lock not found"));
}

#[test]
fn build_without_lock_hash_asks_for_one() {
  let env = TestEnv::unlocked();

  env
    .ptpack_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("ptpack lock"));
}

#[test]
fn edited_lockfile_fails_the_gate() {
  let env = TestEnv::locked();
  env.write_file("app/Cargo.lock", "version = 4\n\n# hand edited\n");

  env
    .ptpack_cmd()
    .arg("build")
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("lock hash mismatch"));

  assert_eq!(env.store_entries(), 0);
}

#[test]
fn edited_manifest_fails_every_platform() {
  let env = TestEnv::locked();
  env.write_file("app/Cargo.toml", "[package]\nname = \"photo-turntable\"\nversion = \"0.2.0\"\n");

  for system in ["x86_64-linux", "aarch64-linux", "x86_64-darwin", "aarch64-darwin"] {
    env
      .ptpack_cmd()
      .args(["build", "--system", system])
      .assert()
      .failure()
      .stderr(predicate::str::contains("lock hash mismatch"));
  }
  env
    .ptpack_cmd()
    .args(["build", "--all"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("lock hash mismatch"));
}

#[test]
fn deleted_lockfile_is_a_mismatch() {
  let env = TestEnv::locked();
  std::fs::remove_file(env.path().join("app/Cargo.lock")).unwrap();

  env
    .ptpack_cmd()
    .arg("check")
    .assert()
    .failure()
    .stderr(predicate::str::contains("lock hash mismatch"))
    .stderr(predicate::str::contains("Cargo.lock missing"));
}

#[test]
fn lock_keeps_descriptor_comments() {
  let env = TestEnv::unlocked();
  let commented = format!(
    "# packaging for the turntable app\n{}",
    env.descriptor().replace("source = \"app\"", "source = \"app\" # relative to this file")
  );
  env.write_file("ptpack.toml", &commented);

  env.ptpack_cmd().arg("lock").assert().success();

  let written = env.descriptor();
  assert!(written.starts_with("# packaging for the turntable app\n[package]\n"));
  assert!(written.contains("source = \"app\" # relative to this file\n"));
  assert!(written.contains("lock_hash = \"sha256:"));
  assert_eq!(written.lines().count(), commented.lines().count() + 1);
}

#[test]
fn check_fails_on_missing_toolchain_component() {
  let env = TestEnv::locked();
  env.write_file(
    "ptpack.toml",
    &(env.descriptor() + "\n[toolchain]\ncomponents = [\"ptpack-absent-component\"]\n"),
  );

  env
    .ptpack_cmd()
    .arg("check")
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("toolchain resolution failed"));
}
