//! pkg-config sandbox for link dependencies.
//!
//! Only the `.pc` files of declared link dependencies (and the modules they
//! require) are staged into a private directory, and `PKG_CONFIG_LIBDIR` is
//! pointed at it. A `*-sys` crate probing for an undeclared library then fails
//! the same way it would on a machine without that library.

use std::collections::{BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

/// Operators that may follow a module name in a `Requires:` field.
const VERSION_OPERATORS: &[&str] = &["=", "!=", "<", "<=", ">", ">="];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgConfigSandbox {
  pub dir: PathBuf,
  /// Modules whose `.pc` file was staged, declared ones and their requirements.
  pub staged: Vec<String>,
  /// Modules pkg-config could not locate on the host.
  pub missing: Vec<String>,
}

impl PkgConfigSandbox {
  /// Environment that confines pkg-config to the sandbox.
  pub fn env(&self) -> [(String, String); 2] {
    [
      ("PKG_CONFIG_LIBDIR".to_string(), self.dir.display().to_string()),
      ("PKG_CONFIG_PATH".to_string(), String::new()),
    ]
  }
}

/// Module names listed in the `Requires` and `Requires.private` fields of a `.pc` file.
pub fn parse_requires(pc: &str) -> Vec<String> {
  let mut modules = Vec::new();
  for line in pc.lines() {
    let Some((key, value)) = line.split_once(':') else {
      continue;
    };
    if !matches!(key.trim(), "Requires" | "Requires.private") {
      continue;
    }
    let mut tokens = value.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty());
    while let Some(token) = tokens.next() {
      if VERSION_OPERATORS.contains(&token) {
        tokens.next();
        continue;
      }
      modules.push(token.to_string());
    }
  }
  modules
}

/// Stage `modules` and their transitive requirements into `dir`.
pub async fn stage_pkg_config(pkg_config: &str, modules: &[&str], dir: &Path) -> io::Result<PkgConfigSandbox> {
  if dir.exists() {
    fs::remove_dir_all(dir).await?;
  }
  fs::create_dir_all(dir).await?;

  let mut sandbox = PkgConfigSandbox {
    dir: dir.to_path_buf(),
    ..Default::default()
  };
  let mut seen = BTreeSet::new();
  let mut queue: VecDeque<String> = modules.iter().map(|m| m.to_string()).collect();

  while let Some(module) = queue.pop_front() {
    if !seen.insert(module.clone()) {
      continue;
    }
    let Some(pcfiledir) = locate(pkg_config, &module).await else {
      warn!(module = %module, "pkg-config module not found on host");
      sandbox.missing.push(module);
      continue;
    };

    let source = pcfiledir.join(format!("{}.pc", module));
    let content = fs::read_to_string(&source).await?;
    // Relocatable .pc files refer to their own directory.
    let staged = content.replace("${pcfiledir}", &pcfiledir.display().to_string());
    fs::write(dir.join(format!("{}.pc", module)), staged).await?;
    debug!(module = %module, from = %source.display(), "staged pkg-config module");

    queue.extend(parse_requires(&content));
    sandbox.staged.push(module);
  }

  Ok(sandbox)
}

async fn locate(pkg_config: &str, module: &str) -> Option<PathBuf> {
  let output = match Command::new(pkg_config)
    .args(["--variable=pcfiledir", module])
    .output()
    .await
  {
    Ok(output) => output,
    Err(e) => {
      warn!(program = pkg_config, error = %e, "failed to run pkg-config");
      return None;
    }
  };
  if !output.status.success() {
    return None;
  }
  let dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
  (!dir.is_empty()).then(|| PathBuf::from(dir))
}
