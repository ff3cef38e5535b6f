//! Structured diagnostics shared by every resolution phase.
//!
//! A [`Diagnostic`] carries a one-line summary, an optional detail, a primary
//! subject range and an optional wider context range. Phases return a batched
//! [`Diagnostics`] collection instead of failing on the first problem, so a
//! user can fix several issues per run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePos {
  pub line: usize,
  pub column: usize,
  pub byte: usize,
}

impl SourcePos {
  pub fn new(line: usize, column: usize, byte: usize) -> Self {
    Self { line, column, byte }
  }
}

/// A span of source text in a named file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
  pub filename: String,
  pub start: SourcePos,
  pub end: SourcePos,
}

impl SourceRange {
  pub fn new(filename: impl Into<String>, start: SourcePos, end: SourcePos) -> Self {
    Self {
      filename: filename.into(),
      start,
      end,
    }
  }
}

impl fmt::Display for SourceRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.start.line == self.end.line {
      write!(
        f,
        "{}:{},{}-{}",
        self.filename, self.start.line, self.start.column, self.end.column
      )
    } else {
      write!(
        f,
        "{}:{},{}-{},{}",
        self.filename, self.start.line, self.start.column, self.end.line, self.end.column
      )
    }
  }
}

/// Diagnostic severity.
///
/// Every diagnostic produced by resolution is an error: a successful result is
/// only returned when the batch is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  #[default]
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Error => write!(f, "error"),
    }
  }
}

/// A single structured problem report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
  pub severity: Severity,
  pub summary: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject: Option<SourceRange>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub context: Option<SourceRange>,
}

impl Diagnostic {
  pub fn error(summary: impl Into<String>) -> Self {
    Self {
      severity: Severity::Error,
      summary: summary.into(),
      detail: None,
      subject: None,
      context: None,
    }
  }

  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = Some(detail.into());
    self
  }

  pub fn with_subject(mut self, subject: SourceRange) -> Self {
    self.subject = Some(subject);
    self
  }

  pub fn with_context(mut self, context: SourceRange) -> Self {
    self.context = Some(context);
    self
  }

  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(subject) = &self.subject {
      write!(f, "{}: ", subject)?;
    }
    write!(f, "{}", self.summary)?;
    if let Some(detail) = &self.detail {
      write!(f, "; {}", detail)?;
    }
    Ok(())
  }
}

/// A batch of diagnostics collected across one or more phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, diagnostic: Diagnostic) {
    self.0.push(diagnostic);
  }

  pub fn extend(&mut self, other: Diagnostics) {
    self.0.extend(other.0);
  }

  pub fn has_errors(&self) -> bool {
    self.0.iter().any(Diagnostic::is_error)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
    self.0.iter()
  }

  /// Attach `context` to every diagnostic in the batch, replacing any
  /// narrower context already present.
  pub fn with_context(mut self, context: &SourceRange) -> Self {
    for diagnostic in &mut self.0 {
      diagnostic.context = Some(context.clone());
    }
    self
  }

  /// `Ok(value)` when the batch is empty, otherwise the batch itself.
  pub fn into_result<T>(self, value: T) -> Result<T, Diagnostics> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl From<Diagnostic> for Diagnostics {
  fn from(diagnostic: Diagnostic) -> Self {
    Self(vec![diagnostic])
  }
}

impl FromIterator<Diagnostic> for Diagnostics {
  fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl IntoIterator for Diagnostics {
  type Item = Diagnostic;
  type IntoIter = std::vec::IntoIter<Diagnostic>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl<'a> IntoIterator for &'a Diagnostics {
  type Item = &'a Diagnostic;
  type IntoIter = std::slice::Iter<'a, Diagnostic>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

impl fmt::Display for Diagnostics {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, diagnostic) in self.0.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{}", diagnostic)?;
    }
    Ok(())
  }
}

impl std::error::Error for Diagnostics {}
