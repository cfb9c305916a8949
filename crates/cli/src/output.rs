//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored status
//! messages, per-target change listings, and Unicode symbols.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use chefsync_lib::diff::{PackageChange, TargetSummary};

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

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const PLUS: &str = "+";
  pub const MINUS: &str = "-";
  pub const TILDE: &str = "~";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Print one target's changes, one package per line.
pub fn print_summary(summary: &TargetSummary) {
  if summary.is_empty() {
    print_info(&format!("{}: no dependency changes", summary.target));
    return;
  }

  println!(
    "{} ({} changed)",
    summary.target.if_supports_color(Stream::Stdout, |s| s.bold()),
    summary.change_count()
  );
  for change in &summary.added {
    println!(
      "  {} {}",
      symbols::PLUS.if_supports_color(Stream::Stdout, |s| s.green()),
      describe_change(change)
    );
  }
  for change in &summary.removed {
    println!(
      "  {} {}",
      symbols::MINUS.if_supports_color(Stream::Stdout, |s| s.red()),
      describe_change(change)
    );
  }
  for change in &summary.updated {
    println!(
      "  {} {}",
      symbols::TILDE.if_supports_color(Stream::Stdout, |s| s.yellow()),
      describe_change(change)
    );
  }
}

fn describe_change(change: &PackageChange) -> String {
  let versions = match (&change.old_version, &change.new_version) {
    (Some(old), Some(new)) => format!("{} {} {}", old, symbols::ARROW, new),
    (Some(version), None) | (None, Some(version)) => version.clone(),
    (None, None) => String::new(),
  };
  format!("{} {} ({})", change.name(), versions, change.display_source())
}
