//! Implementation of the `ptpack check` command.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use ptpack_lib::{devshell, lock};

use crate::cmd::context::{Components, Project};
use crate::output::{print_stat, print_success, print_warning};

/// Validate everything a build needs, without building.
pub fn cmd_check(file: &Path, install_components: bool) -> Result<()> {
  let project = Project::load(file)?;
  let package = project.package()?;
  let (platforms, default) = project.platforms()?;

  project.verify_lock(&package)?;
  let summary = lock::summarize(&package.source)?;
  print_success(&format!("lock hash matches {}", package.lock_hash));
  print_stat("Locked packages", &summary.packages.to_string());

  let names: Vec<String> = platforms.iter().map(ToString::to_string).collect();
  print_success(&format!("{} platforms declared", platforms.len()));
  print_stat("Platforms", &names.join(", "));
  print_stat("Default", &default.to_string());

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let toolchain = rt.block_on(project.resolve_toolchain(Components::from_flag(install_components)))?;
  print_success(&format!("toolchain {}", toolchain.name));
  print_stat("Pin", &toolchain.pin());
  if !toolchain.components.is_empty() {
    print_stat("Components", &toolchain.components.join(", "));
  }

  let dev = devshell::shell(&package, Some(&toolchain), &[], &BTreeMap::new());
  for tool in dev.missing_programs() {
    print_warning(&format!("build tool {} not found on PATH", tool));
  }
  Ok(())
}
