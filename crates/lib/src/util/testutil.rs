//! Test helpers for lake-lib.

use crate::diagnostics::Diagnostics;
use crate::eval::resolve;
use crate::imports::NoImports;
use crate::syntax::{SourceFile, parse_source};
use crate::walk::WalkOutput;

/// Parse `(filename, source)` pairs, panicking on syntax errors.
pub fn parse_files(sources: &[(&str, &str)]) -> Vec<SourceFile> {
  sources
    .iter()
    .map(|(name, src)| parse_source(src, name).unwrap_or_else(|errs| panic!("{name} failed to parse: {errs}")))
    .collect()
}

/// Resolve sources that import nothing.
pub fn resolve_sources(sources: &[(&str, &str)]) -> Result<WalkOutput, Diagnostics> {
  resolve(&parse_files(sources), &mut NoImports)
}

pub fn summaries(diags: &Diagnostics) -> Vec<&str> {
  diags.iter().map(|diag| diag.summary.as_str()).collect()
}
