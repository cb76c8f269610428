//! Content-addressed artifact store.
//!
//! Every build lands in `<store>/build/<hash>/`, where `<hash>` is the
//! [`ObjectHash`] of the build plan. A completion marker recording the hash of
//! the directory contents is written last; entries without a valid marker are
//! treated as interrupted or corrupted and removed before rebuilding.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::platform::paths::store_dir;
use crate::util::hash::{ContentHash, HashError, ObjectHash, hash_directory};

/// Marker file name indicating a build completed successfully.
pub const BUILD_COMPLETE_MARKER: &str = ".ptpack-complete";

/// Entries excluded when hashing a store entry.
const STORE_HASH_EXCLUSIONS: &[&str] = &[BUILD_COMPLETE_MARKER, "tmp"];

const MARKER_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildMarker {
  pub version: u32,
  pub status: String,
  pub output_hash: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("io error in store at {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to hash store entry: {0}")]
  Hash(#[from] HashError),

  #[error("invalid completion marker at {}: {message}", .path.display())]
  Marker { path: PathBuf, message: String },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
  move |source| StoreError::Io {
    path: path.to_path_buf(),
    source,
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
  root: PathBuf,
}

impl Store {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// The store selected by `PTPACK_STORE` / XDG data dir.
  pub fn from_env() -> Self {
    Self::new(store_dir())
  }

  pub fn build_dir(&self, hash: &ObjectHash) -> PathBuf {
    self.root.join("build").join(&hash.0)
  }

  /// Return the recorded output hash of a valid entry.
  ///
  /// Incomplete or corrupted entries are removed and reported as absent.
  pub async fn lookup(&self, hash: &ObjectHash) -> Result<Option<ContentHash>, StoreError> {
    let path = self.build_dir(hash);
    if !path.exists() {
      return Ok(None);
    }

    match read_marker(&path) {
      Ok(Some(marker)) => {
        if let Some(output_hash) = verify_entry(&path, &marker) {
          debug!(path = ?path, "store entry valid (cache hit)");
          return Ok(Some(output_hash));
        }
        debug!(path = ?path, "removing corrupted store entry");
      }
      Ok(None) => debug!(path = ?path, "incomplete store entry, removing"),
      Err(e) => debug!(path = ?path, error = %e, "unreadable marker, removing"),
    }

    fs::remove_dir_all(&path).await.map_err(io_err(&path))?;
    Ok(None)
  }

  /// Create a fresh, empty entry directory for a build.
  pub async fn prepare(&self, hash: &ObjectHash) -> Result<PathBuf, StoreError> {
    let path = self.build_dir(hash);
    if path.exists() {
      fs::remove_dir_all(&path).await.map_err(io_err(&path))?;
    }
    fs::create_dir_all(&path).await.map_err(io_err(&path))?;
    Ok(path)
  }

  /// Hash the entry contents and seal it with a completion marker.
  pub async fn seal(&self, hash: &ObjectHash) -> Result<ContentHash, StoreError> {
    let path = self.build_dir(hash);
    let output_hash = hash_directory(&path, STORE_HASH_EXCLUSIONS)?;

    let marker = BuildMarker {
      version: MARKER_VERSION,
      status: "complete".to_string(),
      output_hash: output_hash.0.clone(),
    };
    let content = serde_json::to_string(&marker).map_err(|e| StoreError::Marker {
      path: path.clone(),
      message: e.to_string(),
    })?;
    let marker_path = path.join(BUILD_COMPLETE_MARKER);
    fs::write(&marker_path, format!("{}\n", content))
      .await
      .map_err(io_err(&marker_path))?;
    Ok(output_hash)
  }

  /// Hashes of all sealed entries currently in the store.
  pub fn entries(&self) -> Vec<ObjectHash> {
    let Ok(dir) = std::fs::read_dir(self.root.join("build")) else {
      return Vec::new();
    };
    let mut hashes: Vec<ObjectHash> = dir
      .flatten()
      .filter(|e| is_complete(&e.path()))
      .filter_map(|e| e.file_name().to_str().map(|s| ObjectHash(s.to_string())))
      .collect();
    hashes.sort();
    hashes
  }
}

/// Read the completion marker, `None` if absent.
pub fn read_marker(entry: &Path) -> Result<Option<BuildMarker>, StoreError> {
  let marker_path = entry.join(BUILD_COMPLETE_MARKER);
  let content = match std::fs::read_to_string(&marker_path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(io_err(&marker_path)(e)),
  };
  let marker = serde_json::from_str(&content).map_err(|e| StoreError::Marker {
    path: marker_path,
    message: e.to_string(),
  })?;
  Ok(Some(marker))
}

pub fn is_complete(entry: &Path) -> bool {
  matches!(read_marker(entry), Ok(Some(_)))
}

/// Re-hash an entry and compare it with its marker.
fn verify_entry(entry: &Path, marker: &BuildMarker) -> Option<ContentHash> {
  match hash_directory(entry, STORE_HASH_EXCLUSIONS) {
    Ok(current) if current.0 == marker.output_hash => Some(current),
    Ok(current) => {
      warn!(
        path = ?entry,
        expected = %marker.output_hash,
        actual = %current.0,
        "store entry corrupted, will rebuild"
      );
      None
    }
    Err(e) => {
      warn!(path = ?entry, error = %e, "failed to hash store entry, will rebuild");
      None
    }
  }
}
