//! Test helpers shared across ptpack-lib.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::build::{CompileFailure, CompileJob, CompileOutput, Compiler};
use crate::lock::hash_lock_inputs;
use crate::native::{NativeDeps, NativeProfile};
use crate::package::{PackageDescriptor, PackageMeta};

pub const CARGO_TOML: &str = r#"[package]
name = "photo-turntable"
version = "0.1.0"
edition = "2021"

[dependencies]
gphoto2 = "3"
"#;

pub const CARGO_LOCK: &str = r#"# This file is automatically @generated by Cargo.
# It is not intended for manual editing.
version = 4

[[package]]
name = "gphoto2"
version = "3.3.1"
source = "registry+https://github.com/rust-lang/crates.io-index"

[[package]]
name = "photo-turntable"
version = "0.1.0"
dependencies = [
 "gphoto2",
]
"#;

/// Write a minimal photo-turntable source tree into `dir`.
pub fn write_source_tree(dir: &Path) {
  std::fs::create_dir_all(dir.join("src")).unwrap();
  std::fs::write(dir.join("Cargo.toml"), CARGO_TOML).unwrap();
  std::fs::write(dir.join("Cargo.lock"), CARGO_LOCK).unwrap();
  std::fs::write(dir.join("src/main.rs"), "fn main() {}\n").unwrap();
}

/// A descriptor for the tree at `source`, locked to its current manifest.
pub fn descriptor_fixture(source: &Path) -> PackageDescriptor {
  PackageDescriptor {
    name: "photo-turntable".to_string(),
    version: "0.1.0".to_string(),
    source: source.to_path_buf(),
    lock_hash: hash_lock_inputs(source).unwrap(),
    bin: "photo-turntable".to_string(),
    native: NativeDeps::from_profile(NativeProfile::Classic),
    meta: PackageMeta {
      license: vec!["MIT".to_string()],
      description: Some("Turntable photography".to_string()),
      homepage: None,
    },
  }
}

enum Behavior {
  Succeed,
  Fail(String),
  NoOutput,
}

/// A [`Compiler`] that writes a deterministic fake binary instead of running cargo.
pub struct FakeCompiler {
  behavior: Behavior,
  calls: AtomicUsize,
  last_env: Mutex<Option<BTreeMap<String, String>>>,
}

impl FakeCompiler {
  fn with(behavior: Behavior) -> Self {
    Self {
      behavior,
      calls: AtomicUsize::new(0),
      last_env: Mutex::new(None),
    }
  }

  pub fn succeeding() -> Self {
    Self::with(Behavior::Succeed)
  }

  /// Fails every job with `diagnostics` as stderr.
  pub fn failing(diagnostics: &str) -> Self {
    Self::with(Behavior::Fail(diagnostics.to_string()))
  }

  /// Reports success without producing a binary.
  pub fn without_output() -> Self {
    Self::with(Behavior::NoOutput)
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn last_env(&self) -> Option<BTreeMap<String, String>> {
    self.last_env.lock().unwrap().clone()
  }
}

impl Compiler for FakeCompiler {
  async fn compile(&self, job: &CompileJob<'_>) -> Result<CompileOutput, CompileFailure> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    *self.last_env.lock().unwrap() = Some(job.env.clone());

    let binary = job.binary_path();
    match &self.behavior {
      Behavior::Fail(diagnostics) => Err(CompileFailure::Failed {
        code: Some(101),
        diagnostics: diagnostics.clone(),
      }),
      Behavior::NoOutput => Ok(CompileOutput { binary }),
      Behavior::Succeed => {
        if let Some(parent) = binary.parent() {
          tokio::fs::create_dir_all(parent).await.unwrap();
        }
        let content = format!("fake {} for {} by {}\n", job.bin, job.target, job.toolchain.pin());
        tokio::fs::write(&binary, content).await.unwrap();
        Ok(CompileOutput { binary })
      }
    }
  }
}
