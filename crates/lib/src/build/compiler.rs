//! The seam between the builder and the actual Rust compiler.
//!
//! [`CargoCompiler`] shells out to `cargo +<toolchain> build`. Tests swap in a
//! fake that writes a binary without invoking cargo.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info};

use crate::toolchain::Toolchain;

/// Variables forwarded from the caller's environment into the compile.
///
/// Everything else is cleared so the build sees only what the builder sets.
const PASSTHROUGH_ENV: &[&str] = &["PATH", "HOME", "CARGO_HOME", "RUSTUP_HOME", "RUSTUP_TOOLCHAIN_DIR", "TMPDIR"];

#[derive(Debug, Clone)]
pub struct CompileJob<'a> {
  pub toolchain: &'a Toolchain,
  pub manifest_path: PathBuf,
  pub bin: String,
  /// rustc target triple.
  pub target: &'static str,
  /// Scratch directory for cargo's `target/`. Never inside the source tree.
  pub target_dir: PathBuf,
  pub env: BTreeMap<String, String>,
}

impl CompileJob<'_> {
  /// Where cargo leaves the release binary for this job.
  pub fn binary_path(&self) -> PathBuf {
    self.target_dir.join(self.target).join("release").join(&self.bin)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
  pub binary: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileFailure {
  /// The compiler could not be started at all.
  Spawn(String),
  /// The compiler ran and failed. `diagnostics` is its stderr.
  Failed { code: Option<i32>, diagnostics: String },
}

pub trait Compiler: Send + Sync {
  fn compile(&self, job: &CompileJob<'_>) -> impl Future<Output = Result<CompileOutput, CompileFailure>> + Send;
}

#[derive(Debug, Clone)]
pub struct CargoCompiler {
  program: String,
}

impl Default for CargoCompiler {
  fn default() -> Self {
    Self {
      program: "cargo".to_string(),
    }
  }
}

impl CargoCompiler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_program(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn command(&self, job: &CompileJob<'_>) -> Command {
    let mut command = Command::new(&self.program);
    command
      .arg(format!("+{}", job.toolchain.name))
      .args(["build", "--release", "--locked", "--bin", &job.bin])
      .arg("--manifest-path")
      .arg(&job.manifest_path)
      .args(["--target", job.target])
      .arg("--target-dir")
      .arg(&job.target_dir)
      .env_clear();

    for key in PASSTHROUGH_ENV {
      if let Ok(value) = std::env::var(key) {
        command.env(key, value);
      }
    }
    command.env("LANG", "C").env("LC_ALL", "C").envs(&job.env);
    command
  }
}

impl Compiler for CargoCompiler {
  async fn compile(&self, job: &CompileJob<'_>) -> Result<CompileOutput, CompileFailure> {
    info!(target = job.target, toolchain = %job.toolchain.name, bin = %job.bin, "compiling");
    let mut command = self.command(job);
    debug!(command = ?command.as_std(), "spawning cargo");

    let output = command
      .output()
      .await
      .map_err(|e| CompileFailure::Spawn(format!("{}: {}", self.program, e)))?;

    if !output.status.success() {
      let diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
      debug!(code = ?output.status.code(), "cargo failed");
      return Err(CompileFailure::Failed {
        code: output.status.code(),
        diagnostics,
      });
    }

    Ok(CompileOutput {
      binary: job.binary_path(),
    })
  }
}
