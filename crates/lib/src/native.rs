//! Native dependency declarations.
//!
//! Two classes of native inputs are declared:
//! - **link**: shared libraries the final binary links against (`libgphoto2`)
//! - **build**: tools needed only while compiling (`pkg-config`, `cmake`)
//!
//! Nothing here checks that the dependencies are installed. A missing library
//! surfaces later as a link failure from the builder.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepKind {
  Link,
  BuildOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeDep {
  pub name: String,
  pub kind: DepKind,
  /// pkg-config module providing this library. Only meaningful for link deps.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pkg_config: Option<String>,
}

impl NativeDep {
  /// A link-time library whose pkg-config module has the same name.
  pub fn link(name: &str) -> Self {
    Self {
      name: name.to_string(),
      kind: DepKind::Link,
      pkg_config: Some(name.to_string()),
    }
  }

  pub fn build_only(name: &str) -> Self {
    Self {
      name: name.to_string(),
      kind: DepKind::BuildOnly,
      pkg_config: None,
    }
  }
}

/// The two packaging revisions of photo-turntable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeProfile {
  /// `libgphoto2` linked, `pkg-config` at build time.
  #[default]
  Classic,
  /// As `Classic`, plus `cmake` for crates that build native code with it.
  Cmake,
}

/// Ordered native dependency lists, consumed verbatim by the builder and the dev shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeDeps {
  pub link: Vec<NativeDep>,
  pub build: Vec<NativeDep>,
}

impl NativeDeps {
  pub fn from_profile(profile: NativeProfile) -> Self {
    let mut build = vec![NativeDep::build_only("pkg-config")];
    if profile == NativeProfile::Cmake {
      build.push(NativeDep::build_only("cmake"));
    }
    Self {
      link: vec![NativeDep::link("libgphoto2")],
      build,
    }
  }

  /// Every declared input: link deps first, then build-only deps.
  pub fn inputs(&self) -> impl Iterator<Item = &NativeDep> {
    self.link.iter().chain(self.build.iter())
  }

  /// pkg-config modules of the link dependencies, in declaration order.
  pub fn pkg_config_modules(&self) -> Vec<&str> {
    self.link.iter().filter_map(|d| d.pkg_config.as_deref()).collect()
  }

  /// Names of build-only tools, which are expected to be programs.
  pub fn build_tools(&self) -> Vec<&str> {
    self.build.iter().map(|d| d.name.as_str()).collect()
  }
}

/// A dependency as written in the descriptor: either a bare name or a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NativeDepSpec {
  Name(String),
  Detailed {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pkg_config: Option<String>,
  },
}

impl NativeDepSpec {
  pub fn into_dep(self, kind: DepKind) -> NativeDep {
    let (name, pkg_config) = match self {
      NativeDepSpec::Name(name) => (name, None),
      NativeDepSpec::Detailed { name, pkg_config } => (name, pkg_config),
    };
    let pkg_config = match kind {
      DepKind::Link => pkg_config.or_else(|| Some(name.clone())),
      DepKind::BuildOnly => None,
    };
    NativeDep { name, kind, pkg_config }
  }
}
