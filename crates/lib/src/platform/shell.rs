//! Shell detection and activation script rendering for dev shells.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  PowerShell,
  Sh,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown shell '{0}' (supported: bash, zsh, fish, sh, powershell)")]
pub struct UnknownShell(pub String);

impl Shell {
  /// Detect the user's shell from `$SHELL`, falling back to `sh`.
  pub fn detect() -> Self {
    let Ok(shell) = env::var("SHELL") else {
      return Shell::Sh;
    };
    let name = PathBuf::from(&shell)
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or("")
      .to_lowercase();

    name.parse().unwrap_or_else(|_| {
      if name.contains("zsh") {
        Shell::Zsh
      } else if name.contains("bash") {
        Shell::Bash
      } else if name.contains("fish") {
        Shell::Fish
      } else {
        Shell::Sh
      }
    })
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Shell::Bash => "bash",
      Shell::Zsh => "zsh",
      Shell::Fish => "fish",
      Shell::PowerShell => "powershell",
      Shell::Sh => "sh",
    }
  }

  /// Program to spawn for an interactive session.
  pub fn program(&self) -> &'static str {
    match self {
      Shell::PowerShell => "pwsh",
      other => other.as_str(),
    }
  }

  pub fn export_var(&self, name: &str, value: &str) -> String {
    match self {
      Shell::Fish => format!("set -gx {} {:?}", name, value),
      Shell::PowerShell => format!("$env:{} = {:?}", name, value),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}={:?}", name, value),
    }
  }

  pub fn comment(&self, text: &str) -> String {
    format!("# {}", text)
  }
}

impl FromStr for Shell {
  type Err = UnknownShell;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "bash" => Ok(Shell::Bash),
      "zsh" => Ok(Shell::Zsh),
      "fish" => Ok(Shell::Fish),
      "sh" => Ok(Shell::Sh),
      "powershell" | "pwsh" => Ok(Shell::PowerShell),
      _ => Err(UnknownShell(s.to_string())),
    }
  }
}

impl std::fmt::Display for Shell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
