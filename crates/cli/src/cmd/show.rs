//! Implementation of the `ptpack show` command.

use std::path::Path;

use anyhow::{Context, Result};

use ptpack_lib::platform::paths::store_dir;

use crate::cmd::context::{Components, Project};
use crate::output::{OutputFormat, output_row, print_json, print_stat};

pub fn cmd_show(file: &Path, output: OutputFormat) -> Result<()> {
  let project = Project::load(file)?;
  let package = project.package()?;
  project.verify_lock(&package)?;
  let id = package.id();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let toolchain = rt.block_on(project.resolve_toolchain(Components::Skip))?;
  let outputs = project.outputs(package, toolchain)?;
  let entries = outputs.show()?;

  if output.is_json() {
    return print_json(&entries);
  }

  println!("{}", id);
  for entry in &entries {
    println!("  {}", output_row(entry));
  }
  print_stat("Store", &store_dir().display().to_string());
  Ok(())
}
