//! Target platforms.
//!
//! A [`Platform`] pairs an architecture with an operating system and is written
//! as a triple such as `aarch64-darwin`. The set of platforms ptpack publishes
//! for is closed: [`PlatformSet::supported`] is a constant list, never discovered
//! at runtime.

pub mod arch;
pub mod os;
pub mod paths;
pub mod shell;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use arch::Arch;
use os::Os;

/// Platform identifier combining architecture and OS (e.g., "aarch64-darwin").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

/// The fixed publication targets, in evaluation order.
pub const SUPPORTED_PLATFORMS: [Platform; 4] = [
  Platform::new(Arch::X86_64, Os::Linux),
  Platform::new(Arch::Aarch64, Os::Linux),
  Platform::new(Arch::X86_64, Os::MacOs),
  Platform::new(Arch::Aarch64, Os::MacOs),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown platform '{0}' (supported: x86_64-linux, aarch64-linux, x86_64-darwin, aarch64-darwin)")]
pub struct UnknownPlatform(pub String);

impl Platform {
  pub const fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the host platform.
  ///
  /// Returns `None` on hosts outside the supported set.
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }

  /// The rustc target triple used to compile for this platform.
  pub fn rust_target(&self) -> &'static str {
    match (self.arch, self.os) {
      (Arch::X86_64, Os::Linux) => "x86_64-unknown-linux-gnu",
      (Arch::Aarch64, Os::Linux) => "aarch64-unknown-linux-gnu",
      (Arch::X86_64, Os::MacOs) => "x86_64-apple-darwin",
      (Arch::Aarch64, Os::MacOs) => "aarch64-apple-darwin",
    }
  }

  pub fn is_host(&self) -> bool {
    Self::current().as_ref() == Some(self)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}

impl FromStr for Platform {
  type Err = UnknownPlatform;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (arch, os) = s.split_once('-').ok_or_else(|| UnknownPlatform(s.to_string()))?;
    match (Arch::parse(arch), Os::parse(os)) {
      (Some(arch), Some(os)) => Ok(Self { arch, os }),
      _ => Err(UnknownPlatform(s.to_string())),
    }
  }
}

impl TryFrom<String> for Platform {
  type Error = UnknownPlatform;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Platform> for String {
  fn from(platform: Platform) -> Self {
    platform.triple()
  }
}

/// An ordered, duplicate-free collection of platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSet(Vec<Platform>);

impl PlatformSet {
  /// Two Linux and two macOS architectures.
  pub fn supported() -> Self {
    Self(SUPPORTED_PLATFORMS.to_vec())
  }

  /// Build a set from a list, keeping first-seen order and dropping duplicates.
  pub fn from_platforms(platforms: impl IntoIterator<Item = Platform>) -> Self {
    let mut out: Vec<Platform> = Vec::new();
    for p in platforms {
      if !out.contains(&p) {
        out.push(p);
      }
    }
    Self(out)
  }

  pub fn contains(&self, platform: &Platform) -> bool {
    self.0.contains(platform)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Platform> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn first(&self) -> Option<Platform> {
    self.0.first().copied()
  }
}

impl Default for PlatformSet {
  fn default() -> Self {
    Self::supported()
  }
}
