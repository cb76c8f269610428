use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn print_bash_script() {
  let env = TestEnv::locked();

  env
    .ptpack_cmd()
    .args(["develop", "--print", "--shell", "bash"])
    .assert()
    .success()
    .stdout(predicate::str::contains("export RUST_BACKTRACE=\"1\""))
    .stdout(predicate::str::contains("# inputs: libgphoto2 pkg-config"))
    .stdout(predicate::str::contains("# tools: rust-analyzer"))
    .stdout(predicate::str::contains("export RUST_LOG=\"photo_turntable=debug\""));
}

#[test]
fn print_fish_script() {
  let env = TestEnv::locked();

  env
    .ptpack_cmd()
    .args(["develop", "--print", "--shell", "fish"])
    .assert()
    .success()
    .stdout(predicate::str::contains("set -gx RUST_BACKTRACE \"1\""));
}

#[test]
fn cmake_profile_adds_cmake_input() {
  let env = TestEnv::unlocked();
  env.write_file("ptpack.toml", &env.descriptor().replace("profile = \"classic\"", "profile = \"cmake\""));
  env.ptpack_cmd().arg("lock").assert().success();

  env
    .ptpack_cmd()
    .args(["develop", "--print", "--shell", "sh"])
    .assert()
    .success()
    .stdout(predicate::str::contains("# inputs: libgphoto2 pkg-config cmake"));
}

#[test]
fn unknown_shell_fails() {
  let env = TestEnv::locked();

  env
    .ptpack_cmd()
    .args(["develop", "--print", "--shell", "tcsh"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown shell"));
}

#[test]
fn develop_never_touches_the_store() {
  let env = TestEnv::locked();

  env
    .ptpack_cmd()
    .args(["develop", "--print", "--shell", "zsh"])
    .assert()
    .success();

  assert_eq!(env.store_entries(), 0);
}

#[test]
fn missing_toolchain_component_leaves_src_path_unset() {
  let env = TestEnv::locked();
  env.write_file(
    "ptpack.toml",
    &(env.descriptor() + "\n[toolchain]\ncomponents = [\"ptpack-absent-component\"]\n"),
  );

  env
    .ptpack_cmd()
    .args(["develop", "--print", "--shell", "sh"])
    .assert()
    .success()
    .stderr(predicate::str::contains("RUST_SRC_PATH will not be set"))
    .stdout(predicate::str::contains("RUST_SRC_PATH").not())
    .stdout(predicate::str::contains("export RUST_BACKTRACE=\"1\""));
}
