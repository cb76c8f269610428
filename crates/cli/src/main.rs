use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ptpack_lib::consts::DESCRIPTOR_FILENAME;

mod cmd;
mod output;

use output::{OutputFormat, print_error};

/// ptpack - reproducible packaging for photo-turntable
#[derive(Parser)]
#[command(name = "ptpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the package descriptor
  #[arg(short, long, global = true, default_value = DESCRIPTOR_FILENAME)]
  file: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the package for the default platform or a named one
  Build {
    /// Platform to build, e.g. aarch64-darwin
    #[arg(long, conflicts_with = "all")]
    system: Option<String>,

    /// Build every declared platform
    #[arg(long)]
    all: bool,
  },

  /// Enter a development shell with the build inputs and tooling
  Develop {
    /// Print the activation script instead of spawning a shell
    #[arg(long)]
    print: bool,

    /// Shell to target (sh, bash, zsh, fish, powershell); auto-detected if omitted
    #[arg(short, long)]
    shell: Option<String>,

    /// Add missing `[toolchain] components` with rustup
    #[arg(long)]
    install_components: bool,
  },

  /// Validate the descriptor, the lock hash and the toolchain
  Check {
    /// Add missing `[toolchain] components` with rustup
    #[arg(long)]
    install_components: bool,
  },

  /// Rewrite the descriptor in canonical form
  Fmt {
    /// Fail instead of rewriting when the descriptor is not formatted
    #[arg(long)]
    check: bool,
  },

  /// Record the lock hash of the source tree in the descriptor
  Lock,

  /// Show the per-platform outputs without building them
  Show {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show host platform and store locations
  Info,
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let file = cli.file.as_path();
  match cli.command {
    Commands::Build { system, all } => cmd::cmd_build(file, system.as_deref(), all),
    Commands::Develop {
      print,
      shell,
      install_components,
    } => cmd::cmd_develop(file, print, shell.as_deref(), install_components),
    Commands::Check { install_components } => cmd::cmd_check(file, install_components),
    Commands::Fmt { check } => cmd::cmd_fmt(file, check),
    Commands::Lock => cmd::cmd_lock(file),
    Commands::Show { output } => cmd::cmd_show(file, output),
    Commands::Info => {
      cmd::cmd_info();
      Ok(())
    }
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
