//! Loading the project a command operates on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use ptpack_lib::build::{CargoCompiler, PackageBuilder};
use ptpack_lib::config::DescriptorFile;
use ptpack_lib::lock;
use ptpack_lib::package::PackageDescriptor;
use ptpack_lib::platform::paths::scratch_dir;
use ptpack_lib::platform::{Platform, PlatformSet};
use ptpack_lib::publish::{Outputs, publish};
use ptpack_lib::store::Store;
use ptpack_lib::toolchain::{RustupResolver, Toolchain, ToolchainResolver};

/// How `[toolchain] components` are treated when resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Components {
  /// Builds hash only the rustc and cargo pin.
  Skip,
  Check,
  Install,
}

impl Components {
  pub fn from_flag(install: bool) -> Self {
    if install { Self::Install } else { Self::Check }
  }
}

/// A loaded descriptor and the directory it lives in.
pub struct Project {
  pub path: PathBuf,
  pub dir: PathBuf,
  pub file: DescriptorFile,
}

impl Project {
  pub fn load(path: &Path) -> Result<Self> {
    let file = DescriptorFile::load(path).with_context(|| format!("Failed to load descriptor {}", path.display()))?;
    let parent = match path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
      _ => PathBuf::from("."),
    };
    let dir = dunce::canonicalize(&parent).with_context(|| format!("Failed to resolve {}", parent.display()))?;
    debug!(descriptor = %path.display(), dir = %dir.display(), "project loaded");
    Ok(Self {
      path: path.to_path_buf(),
      dir,
      file,
    })
  }

  pub fn source_dir(&self) -> PathBuf {
    self.file.source_dir(&self.dir)
  }

  pub fn package(&self) -> Result<PackageDescriptor> {
    Ok(self.file.into_package(&self.dir)?)
  }

  pub fn platforms(&self) -> Result<(PlatformSet, Platform)> {
    Ok(self.file.platforms()?)
  }

  /// Run the lock gate before anything expensive happens.
  pub fn verify_lock(&self, package: &PackageDescriptor) -> Result<()> {
    lock::verify(&package.source, &package.lock_hash)?;
    Ok(())
  }

  pub async fn resolve_toolchain(&self, components: Components) -> Result<Toolchain> {
    let mut request = self.file.toolchain.clone();
    if components == Components::Skip {
      request.components.clear();
    }
    RustupResolver::new()
      .with_component_install(components == Components::Install)
      .resolve(&request)
      .await
      .context("toolchain resolution failed")
  }

  pub fn outputs(&self, package: PackageDescriptor, toolchain: Toolchain) -> Result<Outputs<CargoCompiler>> {
    let (platforms, default) = self.platforms()?;
    let builder = PackageBuilder::new(CargoCompiler::new(), Store::from_env(), scratch_dir());
    Ok(publish(platforms, default, package, builder, toolchain)?)
  }
}
