//! Implementation of the `ptpack develop` command.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use ptpack_lib::devshell;
use ptpack_lib::platform::shell::Shell;

use crate::cmd::context::{Components, Project};
use crate::output::{print_info, print_warning};

pub fn cmd_develop(file: &Path, print: bool, shell: Option<&str>, install_components: bool) -> Result<()> {
  let project = Project::load(file)?;
  let package = project.package()?;
  let shell = match shell {
    Some(name) => name.parse::<Shell>()?,
    None => Shell::detect(),
  };

  // The shell is usable without a toolchain; only RUST_SRC_PATH is lost.
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let toolchain = match rt.block_on(project.resolve_toolchain(Components::from_flag(install_components))) {
    Ok(toolchain) => Some(toolchain),
    Err(e) => {
      print_warning(&format!("{:#}; RUST_SRC_PATH will not be set", e));
      None
    }
  };

  let dev = devshell::shell(
    &package,
    toolchain.as_ref(),
    &project.file.devshell.tools,
    &project.file.devshell.env,
  );

  if let Some(src) = toolchain.as_ref().and_then(|t| t.rust_src_path()).filter(|p| !p.is_dir()) {
    print_warning(&format!(
      "{} does not exist; add \"rust-src\" to [toolchain] components",
      src.display()
    ));
  }
  for program in dev.missing_programs() {
    print_warning(&format!("{} not found on PATH", program));
  }

  if print {
    print!("{}", dev.render(shell));
    return Ok(());
  }

  print_info(&format!("entering {} dev shell for {}", shell, package.id()));
  debug!(program = shell.program(), "spawning shell");
  let status = Command::new(shell.program())
    .envs(&dev.env)
    .current_dir(&package.source)
    .status()
    .with_context(|| format!("Failed to start {}", shell.program()))?;
  debug!(code = ?status.code(), "dev shell exited");
  Ok(())
}
