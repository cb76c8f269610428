//! Package descriptors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::lock::LockHash;
use crate::native::NativeDeps;

/// Metadata attached to every artifact for downstream distribution tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMeta {
  pub license: Vec<String>,
  pub description: Option<String>,
  pub homepage: Option<String>,
}

/// Everything needed to build one package. Constructed once per evaluation
/// from the descriptor file and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
  pub name: String,
  pub version: String,
  /// Absolute path of the source tree.
  pub source: PathBuf,
  pub lock_hash: LockHash,
  /// Name of the binary target the build installs.
  pub bin: String,
  pub native: NativeDeps,
  pub meta: PackageMeta,
}

impl PackageDescriptor {
  /// `name-version`, the human-readable prefix of store entries.
  pub fn id(&self) -> String {
    format!("{}-{}", self.name, self.version)
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.source.join("Cargo.toml")
  }
}
