use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  #[default]
  Stable,
  Beta,
  Nightly,
}

impl Channel {
  pub fn as_str(&self) -> &'static str {
    match self {
      Channel::Stable => "stable",
      Channel::Beta => "beta",
      Channel::Nightly => "nightly",
    }
  }
}

/// `latest` follows the channel head; anything else is an exact rustup toolchain name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ToolchainVersion {
  #[default]
  Latest,
  Pinned(String),
}

impl FromStr for ToolchainVersion {
  type Err = ResolutionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(ResolutionError::InvalidVersion(s.to_string()));
    }
    if s == "latest" {
      return Ok(Self::Latest);
    }
    if s.chars().any(char::is_whitespace) {
      return Err(ResolutionError::InvalidVersion(s.to_string()));
    }
    Ok(Self::Pinned(s.to_string()))
  }
}

impl TryFrom<String> for ToolchainVersion {
  type Error = ResolutionError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<ToolchainVersion> for String {
  fn from(version: ToolchainVersion) -> Self {
    match version {
      ToolchainVersion::Latest => "latest".to_string(),
      ToolchainVersion::Pinned(v) => v,
    }
  }
}

/// What the descriptor asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainRequest {
  #[serde(default)]
  pub channel: Channel,
  #[serde(default)]
  pub version: ToolchainVersion,
  /// Extra rustup components, e.g. `rust-src` for editor tooling.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub components: Vec<String>,
}

impl ToolchainRequest {
  /// The rustup toolchain name passed as `+<name>`.
  pub fn toolchain_name(&self) -> String {
    match &self.version {
      ToolchainVersion::Latest => self.channel.as_str().to_string(),
      ToolchainVersion::Pinned(v) => v.clone(),
    }
  }
}

/// A resolved toolchain. Shared by reference across every build of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
  /// Rustup toolchain name (`stable`, `1.82.0`, ...).
  pub name: String,
  /// First line of `rustc --version`.
  pub rustc: String,
  /// First line of `cargo --version`.
  pub cargo: String,
  pub components: Vec<String>,
  /// `rustc --print sysroot`, when known.
  pub sysroot: Option<PathBuf>,
}

impl Toolchain {
  /// The string that identifies this toolchain in build hashes.
  pub fn pin(&self) -> String {
    format!("{}; {}", self.rustc, self.cargo)
  }

  /// Location of the standard library sources, for `RUST_SRC_PATH`.
  pub fn rust_src_path(&self) -> Option<PathBuf> {
    self
      .sysroot
      .as_ref()
      .map(|root| root.join("lib").join("rustlib").join("src").join("rust").join("library"))
  }

  #[cfg(test)]
  pub(crate) fn fixture(version: &str) -> Self {
    Self {
      name: version.to_string(),
      rustc: format!("rustc {} (f6e511eec 2024-10-15)", version),
      cargo: format!("cargo {} (8f40fc59f 2024-08-21)", version),
      components: Vec::new(),
      sysroot: Some(PathBuf::from(format!("/opt/rust/toolchains/{}", version))),
    }
  }
}

impl fmt::Display for Toolchain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.name, self.rustc)
  }
}

#[derive(Debug, Error)]
pub enum ResolutionError {
  #[error("invalid toolchain version '{0}'")]
  InvalidVersion(String),

  #[error("{tool} not found for toolchain '{toolchain}': {message}")]
  ToolNotFound {
    tool: String,
    toolchain: String,
    message: String,
  },

  #[error("`{cmd}` failed with exit code {code:?}: {stderr}")]
  CommandFailed {
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("toolchain '{toolchain}' lacks components {}; rerun with --install-components", .components.join(", "))]
  MissingComponents { toolchain: String, components: Vec<String> },

  #[error("unexpected output from `{cmd}`: {output:?}")]
  UnexpectedOutput { cmd: String, output: String },
}
