//! The `ptpack.toml` descriptor.
//!
//! ```toml
//! [package]
//! name = "photo-turntable"
//! version = "0.1.0"
//! source = "."
//! lock_hash = "sha256:..."
//! license = ["MIT"]
//!
//! [toolchain]
//! channel = "stable"
//!
//! [native]
//! profile = "cmake"
//!
//! [platforms]
//! default = "aarch64-darwin"
//! ```
//!
//! Every section except `[package]` may be omitted. Relative paths are
//! resolved against the descriptor's directory. Writes go through
//! [`DescriptorDocument`], which edits the file in place.

mod document;

pub use document::DescriptorDocument;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::lock::{LockError, LockHash};
use crate::native::{DepKind, NativeDepSpec, NativeDeps, NativeProfile};
use crate::package::{PackageDescriptor, PackageMeta};
use crate::platform::{Platform, PlatformSet};
use crate::toolchain::ToolchainRequest;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("failed to edit {}: {source}", .path.display())]
  Edit {
    path: PathBuf,
    #[source]
    source: toml_edit::TomlError,
  },

  #[error("[{0}] is not a table")]
  NotATable(&'static str),

  #[error("failed to write {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("no lock_hash in [package]; run `ptpack lock` to record one")]
  MissingLockHash,

  #[error(transparent)]
  InvalidLockHash(#[from] LockError),

  #[error("source tree {} does not exist", .0.display())]
  MissingSource(PathBuf),

  #[error("[platforms] systems must not be empty")]
  NoPlatforms,

  #[error("default platform {0} is not one of the declared systems")]
  DefaultNotDeclared(Platform),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorFile {
  pub package: PackageSection,
  #[serde(default)]
  pub toolchain: ToolchainRequest,
  #[serde(default)]
  pub native: NativeSection,
  #[serde(default)]
  pub platforms: PlatformsSection,
  #[serde(default)]
  pub devshell: DevShellSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
  pub name: String,
  pub version: String,
  #[serde(default = "default_source")]
  pub source: PathBuf,
  /// Binary target; defaults to the package name.
  #[serde(default)]
  pub bin: Option<String>,
  #[serde(default)]
  pub lock_hash: Option<String>,
  #[serde(default)]
  pub license: Vec<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub homepage: Option<String>,
}

fn default_source() -> PathBuf {
  PathBuf::from(".")
}

/// Native inputs. Explicit `link`/`build` lists replace the profile's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeSection {
  #[serde(default)]
  pub profile: NativeProfile,
  #[serde(default)]
  pub link: Option<Vec<NativeDepSpec>>,
  #[serde(default)]
  pub build: Option<Vec<NativeDepSpec>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformsSection {
  #[serde(default)]
  pub systems: Option<Vec<Platform>>,
  #[serde(default)]
  pub default: Option<Platform>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevShellSection {
  /// Extra programs expected on PATH inside the shell.
  #[serde(default)]
  pub tools: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
}

impl DescriptorFile {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let file = Self::parse(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), package = %file.package.name, "loaded descriptor");
    Ok(file)
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Absolute source tree path for a descriptor living in `base`.
  pub fn source_dir(&self, base: &Path) -> PathBuf {
    if self.package.source.is_absolute() {
      self.package.source.clone()
    } else {
      base.join(&self.package.source)
    }
  }

  pub fn native_deps(&self) -> NativeDeps {
    let mut deps = NativeDeps::from_profile(self.native.profile);
    if let Some(link) = &self.native.link {
      deps.link = link.iter().cloned().map(|s| s.into_dep(DepKind::Link)).collect();
    }
    if let Some(build) = &self.native.build {
      deps.build = build.iter().cloned().map(|s| s.into_dep(DepKind::BuildOnly)).collect();
    }
    deps
  }

  /// Declared platforms and the one `default` aliases.
  ///
  /// Without an explicit default the host wins if declared, else the first system.
  pub fn platforms(&self) -> Result<(PlatformSet, Platform), ConfigError> {
    let set = match &self.platforms.systems {
      Some(systems) => PlatformSet::from_platforms(systems.iter().copied()),
      None => PlatformSet::supported(),
    };
    let first = set.first().ok_or(ConfigError::NoPlatforms)?;

    let default = match self.platforms.default {
      Some(p) if set.contains(&p) => p,
      Some(p) => return Err(ConfigError::DefaultNotDeclared(p)),
      None => Platform::current().filter(|host| set.contains(host)).unwrap_or(first),
    };
    Ok((set, default))
  }

  /// Build the immutable package descriptor for a descriptor file in `base`.
  pub fn into_package(&self, base: &Path) -> Result<PackageDescriptor, ConfigError> {
    let lock_hash: LockHash = self
      .package
      .lock_hash
      .as_deref()
      .ok_or(ConfigError::MissingLockHash)?
      .parse()?;

    let source = self.source_dir(base);
    if !source.is_dir() {
      return Err(ConfigError::MissingSource(source));
    }
    let source = dunce::canonicalize(&source).map_err(|source_err| ConfigError::Read {
      path: source.clone(),
      source: source_err,
    })?;

    Ok(PackageDescriptor {
      name: self.package.name.clone(),
      version: self.package.version.clone(),
      source,
      lock_hash,
      bin: self.package.bin.clone().unwrap_or_else(|| self.package.name.clone()),
      native: self.native_deps(),
      meta: PackageMeta {
        license: self.package.license.clone(),
        description: self.package.description.clone(),
        homepage: self.package.homepage.clone(),
      },
    })
  }
}
