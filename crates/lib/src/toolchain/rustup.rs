//! Resolution through rustup-managed toolchains.

use std::io;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info};

use super::{ResolutionError, Toolchain, ToolchainRequest, ToolchainResolver};

/// Resolves toolchains by asking the rustup proxies (`rustc +<name>`, `cargo +<name>`).
///
/// Requested components are checked with `rustup component list --installed`.
/// Nothing is downloaded unless `install_components` is set, in which case
/// missing components are added with `rustup component add`.
#[derive(Debug, Clone)]
pub struct RustupResolver {
  rustup: String,
  rustc: String,
  cargo: String,
  install_components: bool,
}

impl Default for RustupResolver {
  fn default() -> Self {
    Self {
      rustup: "rustup".to_string(),
      rustc: "rustc".to_string(),
      cargo: "cargo".to_string(),
      install_components: false,
    }
  }
}

impl RustupResolver {
  pub fn new() -> Self {
    Self::default()
  }

  /// Use explicit program paths instead of the proxies on `PATH`.
  pub fn with_programs(mut self, rustc: impl Into<String>, cargo: impl Into<String>) -> Self {
    self.rustc = rustc.into();
    self.cargo = cargo.into();
    self
  }

  pub fn with_rustup(mut self, rustup: impl Into<String>) -> Self {
    self.rustup = rustup.into();
    self
  }

  /// Add missing components instead of failing on them.
  pub fn with_component_install(mut self, install: bool) -> Self {
    self.install_components = install;
    self
  }

  async fn run(&self, program: &str, toolchain: &str, args: &[&str]) -> Result<String, ResolutionError> {
    let cmd = format!("{} +{} {}", program, toolchain, args.join(" "));
    debug!(cmd = %cmd, "querying toolchain");

    let output = Command::new(program)
      .arg(format!("+{}", toolchain))
      .args(args)
      .output()
      .await
      .map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ResolutionError::ToolNotFound {
          tool: program.to_string(),
          toolchain: toolchain.to_string(),
          message: e.to_string(),
        },
        _ => ResolutionError::CommandFailed {
          cmd: cmd.clone(),
          code: None,
          stderr: e.to_string(),
        },
      })?;

    if !output.status.success() {
      return Err(ResolutionError::CommandFailed {
        cmd,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run a `rustup` subcommand, returning its stdout.
  async fn rustup(&self, toolchain: &str, args: &[&str]) -> Result<String, ResolutionError> {
    let cmd = format!("{} {}", self.rustup, args.join(" "));
    debug!(cmd = %cmd, "running rustup");

    let output = Command::new(&self.rustup)
      .args(args)
      .output()
      .await
      .map_err(|e| ResolutionError::ToolNotFound {
        tool: self.rustup.clone(),
        toolchain: toolchain.to_string(),
        message: e.to_string(),
      })?;

    if !output.status.success() {
      return Err(ResolutionError::CommandFailed {
        cmd,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Check the requested components against the toolchain, adding missing
  /// ones when installation is enabled.
  async fn ensure_components(&self, toolchain: &str, components: &[String]) -> Result<(), ResolutionError> {
    let installed = self
      .rustup(toolchain, &["component", "list", "--installed", "--toolchain", toolchain])
      .await?;
    let missing = missing_components(&installed, components);
    if missing.is_empty() {
      return Ok(());
    }
    if !self.install_components {
      return Err(ResolutionError::MissingComponents {
        toolchain: toolchain.to_string(),
        components: missing,
      });
    }
    for component in &missing {
      info!(component = %component, toolchain, "installing toolchain component");
      self
        .rustup(toolchain, &["component", "add", "--toolchain", toolchain, component])
        .await?;
    }
    Ok(())
  }
}

impl ToolchainResolver for RustupResolver {
  async fn resolve(&self, request: &ToolchainRequest) -> Result<Toolchain, ResolutionError> {
    let name = request.toolchain_name();

    let rustc_out = self.run(&self.rustc, &name, &["--version"]).await?;
    let rustc = version_line(&rustc_out, "rustc").ok_or_else(|| ResolutionError::UnexpectedOutput {
      cmd: format!("{} --version", self.rustc),
      output: rustc_out.clone(),
    })?;

    let cargo_out = self.run(&self.cargo, &name, &["--version"]).await?;
    let cargo = version_line(&cargo_out, "cargo").ok_or_else(|| ResolutionError::UnexpectedOutput {
      cmd: format!("{} --version", self.cargo),
      output: cargo_out.clone(),
    })?;

    let sysroot = self
      .run(&self.rustc, &name, &["--print", "sysroot"])
      .await
      .ok()
      .filter(|s| !s.is_empty())
      .map(PathBuf::from);

    if !request.components.is_empty() {
      self.ensure_components(&name, &request.components).await?;
    }

    info!(toolchain = %name, rustc = %rustc, "toolchain resolved");

    Ok(Toolchain {
      name,
      rustc,
      cargo,
      components: request.components.clone(),
      sysroot,
    })
  }
}

/// First line of a `--version` output, if it names the expected tool.
fn version_line(output: &str, tool: &str) -> Option<String> {
  let line = output.lines().next()?.trim();
  line.starts_with(tool).then(|| line.to_string())
}

/// Requested components absent from `rustup component list --installed` output.
///
/// Installed entries carry a target suffix (`clippy-x86_64-unknown-linux-gnu`);
/// `rust-src` has none.
fn missing_components(installed: &str, requested: &[String]) -> Vec<String> {
  let is_installed = |component: &str| {
    installed.lines().map(str::trim).any(|line| {
      line == component
        || line
          .strip_prefix(component)
          .and_then(|rest| rest.strip_prefix('-'))
          .is_some_and(|triple| triple.matches('-').count() >= 2)
    })
  };
  requested.iter().filter(|c| !is_installed(c)).cloned().collect()
}
