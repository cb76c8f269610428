//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const CARGO_TOML: &str = r#"[package]
name = "photo-turntable"
version = "0.1.0"
edition = "2021"
"#;

pub const CARGO_LOCK: &str = r#"version = 4

[[package]]
name = "photo-turntable"
version = "0.1.0"
"#;

pub const DESCRIPTOR: &str = r#"[package]
name = "photo-turntable"
version = "0.1.0"
source = "app"
license = ["MIT"]
description = "Turntable photography"

[native]
profile = "classic"

[devshell]
tools = ["rust-analyzer"]

[devshell.env]
RUST_LOG = "photo_turntable=debug"
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the descriptor, the
/// source tree under `app/`, and isolated store and cache paths.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A project whose descriptor has no lock hash yet.
  pub fn unlocked() -> Self {
    let env = Self { temp: TempDir::new().unwrap() };
    env.write_file("app/Cargo.toml", CARGO_TOML);
    env.write_file("app/Cargo.lock", CARGO_LOCK);
    env.write_file("app/src/main.rs", "fn main() {}\n");
    env.write_file("ptpack.toml", DESCRIPTOR);
    env
  }

  /// A project with a recorded lock hash.
  pub fn locked() -> Self {
    let env = Self::unlocked();
    env.ptpack_cmd().arg("lock").assert().success();
    env
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn descriptor_path(&self) -> PathBuf {
    self.path().join("ptpack.toml")
  }

  pub fn descriptor(&self) -> String {
    std::fs::read_to_string(self.descriptor_path()).unwrap()
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn store_path(&self) -> PathBuf {
    self.dir("store")
  }

  /// Get a pre-configured Command for the ptpack binary.
  ///
  /// Runs in the project directory with:
  /// - `PTPACK_STORE`: isolated store
  /// - `XDG_DATA_HOME` / `XDG_CACHE_HOME`: isolated data and scratch
  pub fn ptpack_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("ptpack");
    cmd.current_dir(self.path());
    cmd.env("PTPACK_STORE", self.store_path());
    cmd.env("XDG_DATA_HOME", self.dir("data"));
    cmd.env("XDG_CACHE_HOME", self.dir("cache"));
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Store entries created so far.
  pub fn store_entries(&self) -> usize {
    std::fs::read_dir(self.store_path().join("build"))
      .map(|d| d.count())
      .unwrap_or(0)
  }

  /// Names of the store entries, sorted.
  pub fn store_entry_names(&self) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(self.store_path().join("build"))
      .map(|d| d.filter_map(|e| e.ok()).map(|e| e.file_name().to_string_lossy().into_owned()).collect())
      .unwrap_or_default();
    names.sort();
    names
  }
}
