//! Filesystem locations used by ptpack.
//!
//! All locations follow the XDG base directory conventions and can be
//! redirected through environment variables, which the tests rely on.

use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Environment variable overriding the store root.
pub const STORE_ENV: &str = "PTPACK_STORE";

/// Returns the user's home directory, or the temp dir when `HOME` is unset.
pub fn home_dir() -> PathBuf {
  std::env::var_os("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(std::env::temp_dir)
}

/// `$XDG_DATA_HOME/ptpack` or `~/.local/share/ptpack`.
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var_os("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// `$XDG_CACHE_HOME/ptpack` or `~/.cache/ptpack`.
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var_os("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Root of the content-addressed store.
pub fn store_dir() -> PathBuf {
  if let Some(path) = std::env::var_os(STORE_ENV) {
    return PathBuf::from(path);
  }
  data_dir().join("store")
}

/// Cargo target directories, kept outside both the store and the source tree.
pub fn scratch_dir() -> PathBuf {
  cache_dir().join("scratch")
}
