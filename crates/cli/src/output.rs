//! CLI output formatting utilities.
//!
//! Colored diagnostics on stderr, plain or JSON results on stdout. Color is
//! dropped automatically when the stream is not a terminal or `NO_COLOR` is
//! set.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use lake_lib::diagnostics::{Diagnostic, Diagnostics};

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
  pub const ARROW: &str = "-->";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
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

/// Severity label that starts a diagnostic, e.g. `error:`.
pub fn severity_label(diagnostic: &Diagnostic) -> String {
  format!("{}:", diagnostic.severity)
}

/// The lines printed under a diagnostic's summary: its location, then its
/// detail.
pub fn diagnostic_body(diagnostic: &Diagnostic) -> Vec<String> {
  let mut lines = Vec::new();
  if let Some(subject) = &diagnostic.subject {
    lines.push(format!("{} {}", symbols::ARROW, subject));
  }
  if let Some(detail) = &diagnostic.detail {
    lines.extend(detail.lines().map(str::to_string));
  }
  lines
}

pub fn print_diagnostics(diagnostics: &Diagnostics) {
  for diagnostic in diagnostics {
    eprintln!(
      "{} {}",
      severity_label(diagnostic).if_supports_color(Stream::Stderr, |s| s.red()),
      diagnostic.summary.if_supports_color(Stream::Stderr, |s| s.bold())
    );
    for line in diagnostic_body(diagnostic) {
      eprintln!("  {}", line);
    }
  }
}

#[cfg(test)]
mod tests {
  use lake_lib::diagnostics::{SourcePos, SourceRange};

  use super::*;

  #[test]
  fn test_truncate_hash() {
    assert_eq!(truncate_hash("abcdef123456789"), "abcdef123456");
    assert_eq!(truncate_hash("short"), "short");
    assert_eq!(truncate_hash(""), "");
  }

  #[test]
  fn test_diagnostic_body() {
    let diagnostic = Diagnostic::error("Duplicate name")
      .with_detail("The name \"x\" has already been used.")
      .with_subject(SourceRange::new(
        "Lakefile",
        SourcePos::new(3, 1, 20),
        SourcePos::new(3, 11, 30),
      ));
    assert_eq!(
      diagnostic_body(&diagnostic),
      vec!["--> Lakefile:3,1-11", "The name \"x\" has already been used."]
    );
  }

  #[test]
  fn test_severity_label() {
    assert_eq!(severity_label(&Diagnostic::error("Boom")), "error:");
  }

  #[test]
  fn test_diagnostic_body_without_location() {
    assert!(diagnostic_body(&Diagnostic::error("Boom")).is_empty());
  }
}
