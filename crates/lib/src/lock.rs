//! The lock-hash integrity gate.
//!
//! The lock hash pins the source tree's dependency manifest: `Cargo.toml` and
//! the resolved graph in `Cargo.lock`. It is persisted in the descriptor and must
//! be regenerated (`ptpack lock`) whenever either file changes. A build whose
//! source tree no longer hashes to the recorded value fails closed.
//!
//! # Format
//!
//! `sha256:<64 lowercase hex chars>`

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::util::hash::{HashError, hash_file};

const LOCK_HASH_PREFIX: &str = "sha256:";

/// Files that make up the dependency manifest, in hashing order.
pub const MANIFEST_FILES: [&str; 2] = ["Cargo.toml", "Cargo.lock"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LockHash(String);

impl LockHash {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for LockHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for LockHash {
  type Err = LockError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let digest = s
      .strip_prefix(LOCK_HASH_PREFIX)
      .ok_or_else(|| LockError::InvalidHash(s.to_string()))?;
    let valid = digest.len() == 64 && digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !valid {
      return Err(LockError::InvalidHash(s.to_string()));
    }
    Ok(Self(s.to_string()))
  }
}

impl TryFrom<String> for LockHash {
  type Error = LockError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<LockHash> for String {
  fn from(hash: LockHash) -> Self {
    hash.0
  }
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error("invalid lock hash '{0}': expected sha256:<64 hex chars>")]
  InvalidHash(String),

  #[error("{file} not found in source tree {}", .dir.display())]
  MissingFile { file: &'static str, dir: PathBuf },

  #[error("failed to hash dependency manifest: {0}")]
  Hash(#[from] HashError),

  #[error("failed to read Cargo.lock: {0}")]
  Read(#[source] io::Error),

  #[error("failed to parse Cargo.lock: {0}")]
  Parse(#[source] toml::de::Error),

  #[error("lock hash mismatch: expected {expected}, got {actual}")]
  Mismatch { expected: LockHash, actual: String },
}

/// Hash the dependency manifest of a source tree.
pub fn hash_lock_inputs(source: &Path) -> Result<LockHash, LockError> {
  let mut hasher = Sha256::new();
  for file in MANIFEST_FILES {
    let path = source.join(file);
    if !path.is_file() {
      return Err(LockError::MissingFile {
        file,
        dir: source.to_path_buf(),
      });
    }
    let content = hash_file(&path)?;
    hasher.update(format!("F:{}:{}\n", file, content.0).as_bytes());
  }
  Ok(LockHash(format!("{}{}", LOCK_HASH_PREFIX, hex::encode(hasher.finalize()))))
}

/// Check the source tree against the recorded lock hash.
///
/// A tree whose manifest cannot be hashed (e.g. `Cargo.lock` is missing) is
/// reported as a mismatch, so the gate never opens on an unpinned tree.
pub fn verify(source: &Path, expected: &LockHash) -> Result<LockHash, LockError> {
  let actual = match hash_lock_inputs(source) {
    Ok(actual) => actual,
    Err(LockError::MissingFile { file, .. }) => {
      return Err(LockError::Mismatch {
        expected: expected.clone(),
        actual: format!("<{} missing>", file),
      });
    }
    Err(e) => return Err(e),
  };

  if &actual != expected {
    return Err(LockError::Mismatch {
      expected: expected.clone(),
      actual: actual.0,
    });
  }

  debug!(source = %source.display(), hash = %actual, "lock hash verified");
  Ok(actual)
}

/// What a `Cargo.lock` resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSummary {
  pub version: Option<i64>,
  pub packages: usize,
}

#[derive(Deserialize)]
struct RawLockfile {
  version: Option<i64>,
  #[serde(default)]
  package: Vec<toml::Value>,
}

/// Parse a source tree's `Cargo.lock` to report the size of the resolved graph.
pub fn summarize(source: &Path) -> Result<LockSummary, LockError> {
  let path = source.join("Cargo.lock");
  let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
    io::ErrorKind::NotFound => LockError::MissingFile {
      file: "Cargo.lock",
      dir: source.to_path_buf(),
    },
    _ => LockError::Read(e),
  })?;
  let raw: RawLockfile = toml::from_str(&content).map_err(LockError::Parse)?;
  Ok(LockSummary {
    version: raw.version,
    packages: raw.package.len(),
  })
}
