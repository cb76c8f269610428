//! Implementation of the `ptpack build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use ptpack_lib::package::PackageDescriptor;
use ptpack_lib::platform::Platform;
use ptpack_lib::publish::select_platform;

use crate::cmd::context::{Components, Project};
use crate::output::{format_elapsed, print_artifact, print_error, print_stat};

/// Build one platform (the default unless `system` names another) or, with
/// `all`, every declared platform.
///
/// The lock gate and the platform name are checked before the toolchain is
/// resolved, so both fail fast.
pub fn cmd_build(file: &Path, system: Option<&str>, all: bool) -> Result<()> {
  let project = Project::load(file)?;
  let package = project.package()?;
  let (platforms, default) = project.platforms()?;
  let platform = match system {
    Some(name) => select_platform(&platforms, name)?,
    None => default,
  };
  project.verify_lock(&package)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();
  if all {
    rt.block_on(build_all(&project, package))?;
  } else {
    rt.block_on(build_one(&project, package, platform))?;
  }
  print_stat("Elapsed", &format_elapsed(started.elapsed()));
  Ok(())
}

async fn build_one(project: &Project, package: PackageDescriptor, platform: Platform) -> Result<()> {
  let toolchain = project.resolve_toolchain(Components::Skip).await?;
  let id = package.id();
  let outputs = project.outputs(package, toolchain)?;
  let artifact = outputs.get(platform).await?;
  print_artifact(&id, &artifact);
  Ok(())
}

async fn build_all(project: &Project, package: PackageDescriptor) -> Result<()> {
  let toolchain = project.resolve_toolchain(Components::Skip).await?;
  let id = package.id();
  let outputs = project.outputs(package, toolchain)?;

  let results = outputs.realize_all().await;
  let mut failed = 0;
  for (platform, result) in &results {
    match result {
      Ok(artifact) => print_artifact(&id, artifact),
      Err(e) => {
        failed += 1;
        print_error(&format!("{}: {}", platform, e));
      }
    }
  }
  if failed > 0 {
    bail!("{} of {} platforms failed", failed, results.len());
  }
  Ok(())
}
