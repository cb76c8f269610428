//! The multi-target publisher.
//!
//! [`Outputs`] maps every declared platform to its build, realized lazily:
//! nothing is compiled until a platform is requested, and each platform is
//! built at most once per evaluation. Platforms never share a failure.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::build::{Artifact, BuildError, BuildRequest, Compiler, PackageBuilder};
use crate::package::PackageDescriptor;
use crate::platform::{Platform, PlatformSet};
use crate::store::is_complete;
use crate::toolchain::Toolchain;
use crate::util::hash::ObjectHash;

#[derive(Debug, Error)]
pub enum PublishError {
  #[error("platform {platform} is not in the output set ({declared})")]
  UnknownPlatform { platform: String, declared: String },

  #[error("build failed on {platform}")]
  Build {
    platform: Platform,
    #[source]
    source: Arc<BuildError>,
  },
}

/// A row of `ptpack show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEntry {
  pub platform: Platform,
  pub default: bool,
  pub build_hash: ObjectHash,
  pub store_path: PathBuf,
  /// A sealed store entry already exists.
  pub built: bool,
}

pub type BuildOutcome = Result<Artifact, Arc<BuildError>>;

struct Inner<C> {
  descriptor: PackageDescriptor,
  toolchain: Toolchain,
  builder: PackageBuilder<C>,
  platforms: PlatformSet,
  default: Platform,
  cells: BTreeMap<Platform, OnceCell<BuildOutcome>>,
}

pub struct Outputs<C> {
  inner: Arc<Inner<C>>,
}

impl<C> Clone for Outputs<C> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

/// Assemble the output mapping. Builds nothing.
pub fn publish<C: Compiler>(
  platforms: PlatformSet,
  default: Platform,
  descriptor: PackageDescriptor,
  builder: PackageBuilder<C>,
  toolchain: Toolchain,
) -> Result<Outputs<C>, PublishError> {
  if !platforms.contains(&default) {
    return Err(unknown(&platforms, &default.to_string()));
  }
  let cells = platforms.iter().map(|p| (*p, OnceCell::new())).collect();
  debug!(package = %descriptor.id(), platforms = platforms.len(), default = %default, "outputs assembled");

  Ok(Outputs {
    inner: Arc::new(Inner {
      descriptor,
      toolchain,
      builder,
      platforms,
      default,
      cells,
    }),
  })
}

/// Parse a platform name and check it is part of `platforms`.
pub fn select_platform(platforms: &PlatformSet, name: &str) -> Result<Platform, PublishError> {
  name
    .parse::<Platform>()
    .ok()
    .filter(|p| platforms.contains(p))
    .ok_or_else(|| unknown(platforms, name))
}

fn unknown(platforms: &PlatformSet, requested: &str) -> PublishError {
  PublishError::UnknownPlatform {
    platform: requested.to_string(),
    declared: platforms.iter().map(Platform::to_string).collect::<Vec<_>>().join(", "),
  }
}

impl<C: Compiler> Outputs<C> {
  pub fn platforms(&self) -> &PlatformSet {
    &self.inner.platforms
  }

  pub fn default_platform(&self) -> Platform {
    self.inner.default
  }

  pub fn platform(&self, name: &str) -> Result<Platform, PublishError> {
    select_platform(&self.inner.platforms, name)
  }

  /// The artifact for `platform`, building it on first request.
  pub async fn get(&self, platform: Platform) -> Result<Artifact, PublishError> {
    self.outcome(platform).await?.map_err(|source| PublishError::Build { platform, source })
  }

  /// The artifact behind the `default` alias.
  pub async fn default_artifact(&self) -> Result<Artifact, PublishError> {
    self.get(self.inner.default).await
  }

  async fn outcome(&self, platform: Platform) -> Result<BuildOutcome, PublishError> {
    let inner = &self.inner;
    let cell = inner
      .cells
      .get(&platform)
      .ok_or_else(|| unknown(&inner.platforms, &platform.to_string()))?;

    let outcome = cell
      .get_or_init(|| async {
        let request = BuildRequest {
          descriptor: &inner.descriptor,
          toolchain: &inner.toolchain,
          platform,
        };
        inner.builder.build(request).await.map_err(Arc::new)
      })
      .await;
    Ok(outcome.clone())
  }

  /// Build every platform concurrently and report each result separately.
  pub async fn realize_all(&self) -> BTreeMap<Platform, BuildOutcome>
  where
    C: 'static,
  {
    let mut join_set = JoinSet::new();
    for platform in self.inner.platforms.iter().copied() {
      let outputs = self.clone();
      join_set.spawn(async move {
        let outcome = outputs.outcome(platform).await;
        (platform, outcome)
      });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok((platform, Ok(outcome))) => {
          match &outcome {
            Ok(artifact) => info!(platform = %platform, path = %artifact.store_path.display(), "platform built"),
            Err(e) => info!(platform = %platform, kind = e.kind(), "platform failed"),
          }
          results.insert(platform, outcome);
        }
        Ok((platform, Err(e))) => error!(platform = %platform, error = %e, "platform missing from output set"),
        Err(e) => error!(error = %e, "build task panicked"),
      }
    }
    results
  }

  /// Describe every output without building anything.
  pub fn show(&self) -> Result<Vec<OutputEntry>, BuildError> {
    let inner = &self.inner;
    inner
      .platforms
      .iter()
      .map(|&platform| {
        let request = BuildRequest {
          descriptor: &inner.descriptor,
          toolchain: &inner.toolchain,
          platform,
        };
        let build_hash = inner.builder.build_hash(&request)?;
        let store_path = inner.builder.store().build_dir(&build_hash);
        Ok(OutputEntry {
          platform,
          default: platform == inner.default,
          built: is_complete(&store_path),
          build_hash,
          store_path,
        })
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::SUPPORTED_PLATFORMS;
  use crate::store::Store;
  use crate::util::testutil::{FakeCompiler, descriptor_fixture, write_source_tree};
  use tempfile::TempDir;

  fn outputs(temp: &TempDir, compiler: FakeCompiler) -> Outputs<FakeCompiler> {
    let source = temp.path().join("src");
    write_source_tree(&source);
    let builder = PackageBuilder::new(compiler, Store::new(temp.path().join("store")), temp.path().join("scratch"))
      .with_pkg_config(None);
    publish(
      PlatformSet::supported(),
      SUPPORTED_PLATFORMS[3],
      descriptor_fixture(&source),
      builder,
      Toolchain::fixture("1.82.0"),
    )
    .unwrap()
  }

  #[tokio::test]
  async fn nothing_is_built_until_requested() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::succeeding());

    let shown = outputs.show().unwrap();
    assert_eq!(shown.len(), 4);
    assert!(shown.iter().all(|e| !e.built));
    assert_eq!(shown.iter().filter(|e| e.default).count(), 1);
    assert_eq!(outputs.inner.builder_calls(), 0);

    outputs.get(SUPPORTED_PLATFORMS[0]).await.unwrap();
    assert_eq!(outputs.inner.builder_calls(), 1);
    let shown = outputs.show().unwrap();
    assert!(shown[0].built);
    assert!(!shown[1].built);
  }

  #[tokio::test]
  async fn get_is_memoized() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::succeeding());

    let a = outputs.get(SUPPORTED_PLATFORMS[1]).await.unwrap();
    let b = outputs.get(SUPPORTED_PLATFORMS[1]).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(outputs.inner.builder_calls(), 1);
  }

  #[tokio::test]
  async fn default_alias_is_the_same_artifact() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::succeeding());

    let via_alias = outputs.default_artifact().await.unwrap();
    let by_name = outputs.get(SUPPORTED_PLATFORMS[3]).await.unwrap();
    assert_eq!(via_alias, by_name);
    assert_eq!(outputs.inner.builder_calls(), 1);
  }

  #[tokio::test]
  async fn platforms_have_distinct_store_paths() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::succeeding());

    let results = outputs.realize_all().await;
    assert_eq!(results.len(), 4);
    let mut paths: Vec<_> = results.values().map(|r| r.as_ref().unwrap().store_path.clone()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 4);
  }

  #[tokio::test]
  async fn failures_stay_per_platform() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::failing("ld: library not found for -lgphoto2"));

    let results = outputs.realize_all().await;
    assert_eq!(results.len(), 4);
    for (platform, result) in &results {
      let err = result.as_ref().unwrap_err();
      assert!(matches!(err.as_ref(), BuildError::Link { platform: p, .. } if p == platform));
    }
  }

  #[tokio::test]
  async fn lock_mismatch_fails_every_platform() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::succeeding());
    std::fs::write(temp.path().join("src/Cargo.toml"), "[package]\nname = \"changed\"\n").unwrap();

    for platform in SUPPORTED_PLATFORMS {
      let err = outputs.get(platform).await.unwrap_err();
      match err {
        PublishError::Build { source, .. } => assert_eq!(source.kind(), "lock-mismatch"),
        other => panic!("unexpected error: {other}"),
      }
    }
    assert!(outputs.show().is_err());
    assert_eq!(outputs.inner.builder_calls(), 0);
  }

  #[tokio::test]
  async fn build_error_names_platform_and_keeps_diagnostics_in_source() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::failing("rust-lld: error: unable to find library -lgphoto2"));

    let err = outputs.get(SUPPORTED_PLATFORMS[0]).await.unwrap_err();
    assert_eq!(err.to_string(), format!("build failed on {}", SUPPORTED_PLATFORMS[0]));
    let source = std::error::Error::source(&err).unwrap().to_string();
    assert!(source.contains("-lgphoto2"));
  }

  #[tokio::test]
  async fn unknown_platform_is_rejected() {
    let temp = TempDir::new().unwrap();
    let outputs = outputs(&temp, FakeCompiler::succeeding());
    let err = outputs.platform("riscv64-linux").unwrap_err();
    assert!(matches!(err, PublishError::UnknownPlatform { .. }));
    assert_eq!(outputs.platform("aarch64-linux").unwrap(), SUPPORTED_PLATFORMS[1]);
  }

  #[test]
  fn default_outside_set_is_rejected() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    write_source_tree(&source);
    let builder = PackageBuilder::new(FakeCompiler::succeeding(), Store::new(temp.path()), temp.path());
    let result = publish(
      PlatformSet::from_platforms([SUPPORTED_PLATFORMS[0]]),
      SUPPORTED_PLATFORMS[2],
      descriptor_fixture(&source),
      builder,
      Toolchain::fixture("1.82.0"),
    );
    assert!(matches!(result, Err(PublishError::UnknownPlatform { .. })));
  }

  impl Inner<FakeCompiler> {
    fn builder_calls(&self) -> usize {
      self.builder.compiler().calls()
    }
  }
}
