use predicates::prelude::*;

use ptpack_lib::platform::Platform;

use super::common::TestEnv;

/// The `Output hash` line of a successful build.
fn output_hash(stdout: &[u8]) -> String {
  String::from_utf8_lossy(stdout)
    .lines()
    .find(|l| l.contains("Output hash"))
    .map(|l| l.trim().to_string())
    .unwrap()
}

#[test]
fn unknown_system_is_rejected() {
  let env = TestEnv::locked();

  env
    .ptpack_cmd()
    .args(["build", "--system", "riscv64-linux"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("riscv64-linux"))
    .stderr(predicate::str::contains("not in the output set"));
}

#[test]
fn undeclared_system_is_rejected() {
  let env = TestEnv::locked();
  let descriptor = env.descriptor() + "\n[platforms]\nsystems = [\"x86_64-linux\", \"aarch64-linux\"]\n";
  env.write_file("ptpack.toml", &descriptor);

  env
    .ptpack_cmd()
    .args(["build", "--system", "aarch64-darwin"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not in the output set"));
}

#[test]
fn default_must_be_declared() {
  let env = TestEnv::locked();
  let descriptor = env.descriptor() + "\n[platforms]\nsystems = [\"x86_64-linux\"]\ndefault = \"aarch64-darwin\"\n";
  env.write_file("ptpack.toml", &descriptor);

  env
    .ptpack_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("default platform aarch64-darwin"));
}

#[test]
fn missing_source_tree_is_reported() {
  let env = TestEnv::locked();
  std::fs::remove_dir_all(env.path().join("app")).unwrap();

  env
    .ptpack_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn host_build_is_stored_cached_and_reproducible() {
  let Some(host) = Platform::current() else {
    return;
  };
  let system = host.to_string();
  let env = TestEnv::locked();

  let first = env
    .ptpack_cmd()
    .args(["build", "--system", &system])
    .assert()
    .success()
    .stdout(predicate::str::contains(env.store_path().join("build").display().to_string()))
    .stdout(predicate::str::contains("(cached)").not())
    .get_output()
    .stdout
    .clone();
  assert_eq!(env.store_entries(), 1);
  let entry = env.store_entry_names().remove(0);
  assert!(env.store_path().join("build").join(&entry).join("bin/photo-turntable").is_file());

  env
    .ptpack_cmd()
    .args(["build", "--system", &system])
    .assert()
    .success()
    .stdout(predicate::str::contains("(cached)"));
  assert_eq!(env.store_entries(), 1);

  // A second checkout at a different path, with its own store.
  let other = TestEnv::locked();
  let second = other
    .ptpack_cmd()
    .args(["build", "--system", &system])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();
  assert_eq!(other.store_entry_names(), vec![entry.clone()]);
  assert_eq!(output_hash(&first), output_hash(&second));

  let binary = |env: &TestEnv| std::fs::read(env.store_path().join("build").join(&entry).join("bin/photo-turntable")).unwrap();
  assert_eq!(binary(&env), binary(&other));
}

#[test]
fn undeclared_native_library_is_a_link_error() {
  let Some(host) = Platform::current() else {
    return;
  };
  let env = TestEnv::unlocked();
  env.write_file(
    "app/build.rs",
    "fn main() {\n  println!(\"cargo:rustc-link-lib=gphoto2_ptpack_absent\");\n}\n",
  );
  env.ptpack_cmd().arg("lock").assert().success();

  env
    .ptpack_cmd()
    .args(["build", "--system", &host.to_string()])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains(format!("build failed on {}", host)))
    .stderr(predicate::str::contains("link error"))
    .stderr(predicate::str::contains("gphoto2_ptpack_absent"));

  assert_eq!(env.store_entries(), 0);
}
