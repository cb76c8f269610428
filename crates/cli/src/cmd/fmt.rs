//! Implementation of the `ptpack fmt` command.

use std::path::Path;

use anyhow::{Result, bail};

use ptpack_lib::config::DescriptorDocument;

use crate::output::print_success;

pub fn cmd_fmt(file: &Path, check: bool) -> Result<()> {
  let mut document = DescriptorDocument::load(file)?;
  document.format();

  if !document.is_modified() {
    print_success(&format!("{} is formatted", file.display()));
    return Ok(());
  }
  if check {
    bail!("{} is not formatted; run `ptpack fmt`", file.display());
  }

  document.save()?;
  print_success(&format!("formatted {}", file.display()));
  Ok(())
}
