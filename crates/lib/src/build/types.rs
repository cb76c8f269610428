use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lock::{LockError, LockHash};
use crate::native::NativeDeps;
use crate::package::{PackageDescriptor, PackageMeta};
use crate::platform::Platform;
use crate::store::StoreError;
use crate::toolchain::Toolchain;
use crate::util::hash::{ContentHash, HashError, Hashable, ObjectHash};

/// One (package, platform) build.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
  pub descriptor: &'a PackageDescriptor,
  pub toolchain: &'a Toolchain,
  pub platform: Platform,
}

/// Everything that determines a build's output. Its hash names the store entry.
///
/// The source location is deliberately absent; only its contents count, so two
/// checkouts of the same tree share store entries.
#[derive(Debug, Serialize)]
pub struct BuildPlan<'a> {
  pub name: &'a str,
  pub version: &'a str,
  pub bin: &'a str,
  pub lock_hash: &'a LockHash,
  pub source_hash: ContentHash,
  pub native: &'a NativeDeps,
  pub meta: &'a PackageMeta,
  pub toolchain: String,
  pub platform: Platform,
  pub target: &'static str,
}

impl Hashable for BuildPlan<'_> {}

/// Metadata written next to the binary as `meta.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
  pub name: String,
  pub version: String,
  pub bin: String,
  pub platform: Platform,
  pub target: String,
  pub toolchain: String,
  pub lock_hash: LockHash,
  pub license: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub homepage: Option<String>,
  pub link_inputs: Vec<String>,
  pub build_inputs: Vec<String>,
}

/// A built, sealed store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  pub platform: Platform,
  pub build_hash: ObjectHash,
  pub store_path: PathBuf,
  pub bin_path: PathBuf,
  pub output_hash: ContentHash,
  pub meta: ArtifactMeta,
  /// Served from the store without compiling.
  pub cached: bool,
}

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("lock hash mismatch: expected {expected}, got {actual}")]
  LockMismatch { expected: LockHash, actual: String },

  #[error("compile error on {platform}:\n{diagnostics}")]
  Compile { platform: Platform, diagnostics: String },

  #[error("link error on {platform}:\n{diagnostics}")]
  Link { platform: Platform, diagnostics: String },

  #[error("failed to run compiler: {0}")]
  Spawn(String),

  #[error("compiler reported success but {} does not exist", .0.display())]
  MissingBinary(PathBuf),

  #[error(transparent)]
  Lock(LockError),

  #[error("failed to hash build inputs: {0}")]
  Hash(#[from] HashError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("failed to write artifact metadata: {0}")]
  Metadata(#[source] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

impl From<LockError> for BuildError {
  fn from(err: LockError) -> Self {
    match err {
      LockError::Mismatch { expected, actual } => BuildError::LockMismatch { expected, actual },
      other => BuildError::Lock(other),
    }
  }
}

impl BuildError {
  /// Short, stable name of the failure class, for reports.
  pub fn kind(&self) -> &'static str {
    match self {
      BuildError::LockMismatch { .. } => "lock-mismatch",
      BuildError::Compile { .. } => "compile",
      BuildError::Link { .. } => "link",
      _ => "internal",
    }
  }
}
