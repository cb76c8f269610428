//! CLI output formatting.
//!
//! Status lines go to stdout, except errors and warnings which go to stderr so
//! `ptpack develop --print` and `-o json` stay machine-readable.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream, Style};

use ptpack_lib::build::Artifact;
use ptpack_lib::publish::OutputEntry;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
  Success,
  Error,
  Warning,
  Info,
}

impl Status {
  fn symbol(self) -> &'static str {
    match self {
      Status::Success => "✓",
      Status::Error => "✗",
      Status::Warning => "⚠",
      Status::Info => "•",
    }
  }

  fn style(self) -> Style {
    match self {
      Status::Success => Style::new().green(),
      Status::Error => Style::new().red(),
      Status::Warning => Style::new().yellow(),
      Status::Info => Style::new().blue(),
    }
  }

  fn to_stderr(self) -> bool {
    matches!(self, Status::Error | Status::Warning)
  }
}

fn status_line(status: Status, message: &str) {
  let style = status.style();
  if status.to_stderr() {
    let stream = Stream::Stderr;
    eprintln!(
      "{} {}",
      status.symbol().if_supports_color(stream, |s| s.style(style)),
      message.if_supports_color(stream, |s| s.style(style))
    );
  } else {
    println!(
      "{} {}",
      status.symbol().if_supports_color(Stream::Stdout, |s| s.style(style)),
      message
    );
  }
}

pub fn print_success(message: &str) {
  status_line(Status::Success, message);
}

pub fn print_error(message: &str) {
  status_line(Status::Error, message);
}

pub fn print_warning(message: &str) {
  status_line(Status::Warning, message);
}

pub fn print_info(message: &str) {
  status_line(Status::Info, message);
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Store hashes are long; twelve characters identify an entry in practice.
pub fn truncate_hash(hash: &str) -> &str {
  &hash[..hash.len().min(12)]
}

/// Elapsed time rounded to what a human cares about.
pub fn format_elapsed(elapsed: Duration) -> String {
  let rounded = if elapsed >= Duration::from_secs(1) {
    Duration::from_secs(elapsed.as_secs())
  } else {
    Duration::from_millis(elapsed.as_millis() as u64)
  };
  humantime::format_duration(rounded).to_string()
}

/// Report a realized artifact of package `id`.
pub fn print_artifact(id: &str, artifact: &Artifact) {
  let suffix = if artifact.cached { " (cached)" } else { "" };
  print_success(&format!("{} for {}{}", id, artifact.platform, suffix));
  print_stat("Store path", &artifact.store_path.display().to_string());
  print_stat("Binary", &artifact.bin_path.display().to_string());
  print_stat("Output hash", truncate_hash(&artifact.output_hash.0));
}

/// One `ptpack show` row: `x86_64-linux (default) → 3f9c0a1b2c4d [built]`.
pub fn output_row(entry: &OutputEntry) -> String {
  format!(
    "{}{} → {} [{}]",
    entry.platform,
    if entry.default { " (default)" } else { "" },
    truncate_hash(&entry.build_hash.0),
    if entry.built { "built" } else { "not built" }
  )
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
