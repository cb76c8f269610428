//! Implementation of the `ptpack lock` command.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use ptpack_lib::config::DescriptorDocument;
use ptpack_lib::lock::{hash_lock_inputs, summarize};

use crate::cmd::context::Project;
use crate::output::{print_stat, print_success};

/// Record the current lock hash of the source tree in the descriptor.
///
/// Only `package.lock_hash` is rewritten; the rest of the file is left as written.
pub fn cmd_lock(file: &Path) -> Result<()> {
  let project = Project::load(file)?;
  let source = project.source_dir();
  let hash = hash_lock_inputs(&source)?;
  let summary = summarize(&source)?;

  let mut document = DescriptorDocument::load(&project.path)?;
  let previous = document.file().package.lock_hash.clone();
  if document.set_lock_hash(&hash)? {
    info!(previous = ?previous, current = %hash, "updating lock hash");
    document.save()?;
    print_success(&format!("recorded lock hash {}", hash));
  } else {
    print_success(&format!("lock hash up to date: {}", hash));
  }
  print_stat("Locked packages", &summary.packages.to_string());
  Ok(())
}
