//! Development shells.
//!
//! A dev shell exposes exactly the native inputs the builder receives, plus
//! editor tooling and a few environment variables. It never builds and never
//! touches the store.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::native::NativeDep;
use crate::package::PackageDescriptor;
use crate::platform::shell::Shell;
use crate::toolchain::Toolchain;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevShell<'a> {
  /// Link deps followed by build-only deps, borrowed from the descriptor.
  pub inputs: Vec<&'a NativeDep>,
  /// Extra programs that are not build inputs (`rust-analyzer`, ...).
  pub tools: Vec<String>,
  pub env: BTreeMap<String, String>,
}

/// Provision the dev shell for `descriptor`.
///
/// `toolchain` is optional: without it the shell still works but
/// `RUST_SRC_PATH` and `RUSTUP_TOOLCHAIN` are left unset.
pub fn shell<'a>(
  descriptor: &'a PackageDescriptor,
  toolchain: Option<&Toolchain>,
  extra_tools: &[String],
  extra_env: &BTreeMap<String, String>,
) -> DevShell<'a> {
  let mut env = BTreeMap::from([("RUST_BACKTRACE".to_string(), "1".to_string())]);
  if let Some(toolchain) = toolchain {
    env.insert("RUSTUP_TOOLCHAIN".to_string(), toolchain.name.clone());
    if let Some(src) = toolchain.rust_src_path() {
      env.insert("RUST_SRC_PATH".to_string(), src.display().to_string());
    }
  }
  env.extend(extra_env.iter().map(|(k, v)| (k.clone(), v.clone())));

  let shell = DevShell {
    inputs: descriptor.native.inputs().collect(),
    tools: extra_tools.to_vec(),
    env,
  };
  debug!(inputs = shell.inputs.len(), tools = shell.tools.len(), "dev shell provisioned");
  shell
}

impl DevShell<'_> {
  /// Programs the shell expects on `PATH`: build-only inputs, then extra tools.
  pub fn programs(&self) -> Vec<&str> {
    self
      .inputs
      .iter()
      .filter(|d| d.pkg_config.is_none())
      .map(|d| d.name.as_str())
      .chain(self.tools.iter().map(String::as_str))
      .collect()
  }

  /// Programs from [`DevShell::programs`] that cannot be found on `PATH`.
  pub fn missing_programs(&self) -> Vec<&str> {
    self.programs().into_iter().filter(|p| which::which(p).is_err()).collect()
  }

  /// Activation script for `shell`.
  pub fn render(&self, shell: Shell) -> String {
    let names: Vec<&str> = self.inputs.iter().map(|d| d.name.as_str()).collect();
    let mut lines = vec![
      shell.comment("ptpack dev shell"),
      shell.comment(&format!("inputs: {}", names.join(" "))),
    ];
    if !self.tools.is_empty() {
      lines.push(shell.comment(&format!("tools: {}", self.tools.join(" "))));
    }
    lines.extend(self.env.iter().map(|(k, v)| shell.export_var(k, v)));
    lines.join("\n") + "\n"
  }
}
