//! The package builder.
//!
//! One call to [`PackageBuilder::build`] turns a (descriptor, toolchain,
//! platform) triple into a sealed store entry:
//!
//! ```text
//! <store>/build/<hash>/
//! ├── bin/<bin>
//! ├── meta.json
//! └── .ptpack-complete
//! ```
//!
//! The lock gate runs before anything else. No failure is retried.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::build::classify::{FailureKind, classify};
use crate::build::compiler::{CompileFailure, CompileJob, Compiler};
use crate::build::sandbox::stage_pkg_config;
use crate::build::types::{Artifact, ArtifactMeta, BuildError, BuildPlan, BuildRequest};
use crate::consts::{REMAPPED_SOURCE_PREFIX, SOURCE_DATE_EPOCH};
use crate::lock;
use crate::platform::paths::home_dir;
use crate::store::Store;
use crate::util::hash::{ContentHash, Hashable, ObjectHash, hash_directory};

/// Source tree entries that never affect the build.
const SOURCE_HASH_EXCLUSIONS: &[&str] = &["target", ".git"];

const META_FILE: &str = "meta.json";

pub struct PackageBuilder<C> {
  compiler: C,
  store: Store,
  scratch: PathBuf,
  pkg_config: Option<String>,
}

impl<C: Compiler> PackageBuilder<C> {
  pub fn new(compiler: C, store: Store, scratch: impl Into<PathBuf>) -> Self {
    Self {
      compiler,
      store,
      scratch: scratch.into(),
      pkg_config: Some("pkg-config".to_string()),
    }
  }

  /// Program used to stage the link-dependency sandbox. `None` disables staging.
  pub fn with_pkg_config(mut self, program: Option<String>) -> Self {
    self.pkg_config = program;
    self
  }

  pub fn store(&self) -> &Store {
    &self.store
  }

  pub fn compiler(&self) -> &C {
    &self.compiler
  }

  /// Hash identifying the build of `request`, verifying the lock first.
  pub fn build_hash(&self, request: &BuildRequest<'_>) -> Result<ObjectHash, BuildError> {
    lock::verify(&request.descriptor.source, &request.descriptor.lock_hash)?;
    let source_hash = hash_directory(&request.descriptor.source, SOURCE_HASH_EXCLUSIONS)?;
    Ok(plan(request, source_hash).compute_hash()?)
  }

  pub async fn build(&self, request: BuildRequest<'_>) -> Result<Artifact, BuildError> {
    let descriptor = request.descriptor;
    let platform = request.platform;

    let hash = self.build_hash(&request)?;
    info!(package = %descriptor.id(), platform = %platform, hash = %hash, "building");

    if let Some(output_hash) = self.store.lookup(&hash).await? {
      match read_meta(&self.store.build_dir(&hash)).await {
        Ok(meta) => {
          info!(platform = %platform, hash = %hash, "using cached build");
          return Ok(self.artifact(&hash, output_hash, meta, true));
        }
        Err(e) => warn!(hash = %hash, error = %e, "unreadable artifact metadata, rebuilding"),
      }
    }

    let work = self.scratch.join(&hash.0);
    let mut env = self.compile_env(&request, &work);

    if let Some(program) = &self.pkg_config {
      let modules = descriptor.native.pkg_config_modules();
      let sandbox = stage_pkg_config(program, &modules, &work.join("pkgconfig")).await?;
      debug!(staged = ?sandbox.staged, missing = ?sandbox.missing, "pkg-config sandbox ready");
      env.extend(sandbox.env());
    }

    let job = CompileJob {
      toolchain: request.toolchain,
      manifest_path: descriptor.manifest_path(),
      bin: descriptor.bin.clone(),
      target: platform.rust_target(),
      target_dir: work.join("target"),
      env,
    };

    let output = self.compiler.compile(&job).await.map_err(|failure| match failure {
      CompileFailure::Spawn(message) => BuildError::Spawn(message),
      CompileFailure::Failed { diagnostics, .. } => match classify(&diagnostics) {
        FailureKind::Link => BuildError::Link { platform, diagnostics },
        FailureKind::Compile => BuildError::Compile { platform, diagnostics },
      },
    })?;

    if !output.binary.is_file() {
      return Err(BuildError::MissingBinary(output.binary));
    }

    let entry = self.store.prepare(&hash).await?;
    let bin_dir = entry.join("bin");
    fs::create_dir_all(&bin_dir).await?;
    fs::copy(&output.binary, bin_dir.join(&descriptor.bin)).await?;

    let meta = artifact_meta(&request);
    let json = serde_json::to_string_pretty(&meta).map_err(BuildError::Metadata)?;
    fs::write(entry.join(META_FILE), format!("{}\n", json)).await?;

    let output_hash = self.store.seal(&hash).await?;
    info!(platform = %platform, output = %output_hash.short(), "build complete");

    Ok(self.artifact(&hash, output_hash, meta, false))
  }

  fn artifact(&self, hash: &ObjectHash, output_hash: ContentHash, meta: ArtifactMeta, cached: bool) -> Artifact {
    let store_path = self.store.build_dir(hash);
    let bin_path = store_path.join("bin").join(&meta.bin);
    Artifact {
      platform: meta.platform,
      build_hash: hash.clone(),
      store_path,
      bin_path,
      output_hash,
      meta,
      cached,
    }
  }

  /// Environment for a reproducible compile.
  ///
  /// Absolute paths of the source tree, the scratch directory and the cargo
  /// home are remapped so they do not leak into the binary.
  fn compile_env(&self, request: &BuildRequest<'_>, work: &Path) -> BTreeMap<String, String> {
    let cargo_home = std::env::var_os("CARGO_HOME")
      .map(PathBuf::from)
      .unwrap_or_else(|| home_dir().join(".cargo"));
    let remaps = [
      (request.descriptor.source.as_path(), REMAPPED_SOURCE_PREFIX),
      (work, "/build/scratch"),
      (cargo_home.as_path(), "/build/cargo"),
    ];
    let rustflags = remaps
      .iter()
      .map(|(from, to)| format!("--remap-path-prefix={}={}", from.display(), to))
      .collect::<Vec<_>>()
      .join("\x1f");

    let mut env = BTreeMap::from([
      ("SOURCE_DATE_EPOCH".to_string(), SOURCE_DATE_EPOCH.to_string()),
      ("CARGO_INCREMENTAL".to_string(), "0".to_string()),
      ("CARGO_ENCODED_RUSTFLAGS".to_string(), rustflags),
    ]);
    if !request.platform.is_host() {
      env.insert("PKG_CONFIG_ALLOW_CROSS".to_string(), "1".to_string());
    }
    env
  }
}

fn plan<'a>(request: &BuildRequest<'a>, source_hash: ContentHash) -> BuildPlan<'a> {
  let descriptor = request.descriptor;
  BuildPlan {
    name: &descriptor.name,
    version: &descriptor.version,
    bin: &descriptor.bin,
    lock_hash: &descriptor.lock_hash,
    source_hash,
    native: &descriptor.native,
    meta: &descriptor.meta,
    toolchain: request.toolchain.pin(),
    platform: request.platform,
    target: request.platform.rust_target(),
  }
}

fn artifact_meta(request: &BuildRequest<'_>) -> ArtifactMeta {
  let descriptor = request.descriptor;
  ArtifactMeta {
    name: descriptor.name.clone(),
    version: descriptor.version.clone(),
    bin: descriptor.bin.clone(),
    platform: request.platform,
    target: request.platform.rust_target().to_string(),
    toolchain: request.toolchain.pin(),
    lock_hash: descriptor.lock_hash.clone(),
    license: descriptor.meta.license.clone(),
    description: descriptor.meta.description.clone(),
    homepage: descriptor.meta.homepage.clone(),
    link_inputs: descriptor.native.link.iter().map(|d| d.name.clone()).collect(),
    build_inputs: descriptor.native.build.iter().map(|d| d.name.clone()).collect(),
  }
}

async fn read_meta(entry: &Path) -> Result<ArtifactMeta, BuildError> {
  let content = fs::read_to_string(entry.join(META_FILE)).await?;
  serde_json::from_str(&content).map_err(BuildError::Metadata)
}
