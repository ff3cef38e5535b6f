//! Name registry.
//!
//! Recipe and attribute names are directory-wide; import aliases are scoped
//! to the file that declares them. A global name also conflicts with an alias
//! in any file, because the alias would shadow it there.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::diagnostics::{Diagnostic, SourceRange};
use crate::syntax::FileId;

/// A name was registered a second time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
  "The name \"{name}\" has already been used at {existing}. Target, store, and attribute names must be unique."
)]
pub struct DuplicateName {
  pub name: String,
  pub existing: SourceRange,
  pub range: SourceRange,
}

impl DuplicateName {
  pub fn into_diagnostic(self) -> Diagnostic {
    Diagnostic::error("Duplicate name")
      .with_detail(self.to_string())
      .with_subject(self.range)
  }
}

impl From<DuplicateName> for Diagnostic {
  fn from(err: DuplicateName) -> Self {
    err.into_diagnostic()
  }
}

/// Tracks where each name was first defined.
#[derive(Debug, Default)]
pub struct NameRegistry {
  globals: HashMap<String, SourceRange>,
  aliases: HashMap<FileId, HashMap<String, SourceRange>>,
}

impl NameRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a recipe or attribute name for the whole directory.
  ///
  /// On conflict the first definition is kept.
  pub fn register_global(&mut self, name: &str, range: &SourceRange) -> Result<(), DuplicateName> {
    if let Some(existing) = self.globals.get(name) {
      return Err(self.duplicate(name, existing, range));
    }
    // Report the earliest alias when several files shadow the name.
    let mut shadowing: Vec<(&FileId, &SourceRange)> = self
      .aliases
      .iter()
      .filter_map(|(file, aliases)| aliases.get(name).map(|existing| (file, existing)))
      .collect();
    shadowing.sort_by_key(|(file, _)| **file);
    if let Some((_, existing)) = shadowing.first() {
      return Err(self.duplicate(name, existing, range));
    }
    self.globals.insert(name.to_string(), range.clone());
    Ok(())
  }

  /// Register an import alias visible only inside `file`.
  pub fn register_alias(&mut self, file: FileId, alias: &str, range: &SourceRange) -> Result<(), DuplicateName> {
    let existing = self
      .aliases
      .get(&file)
      .and_then(|aliases| aliases.get(alias))
      .or_else(|| self.globals.get(alias));
    if let Some(existing) = existing {
      return Err(self.duplicate(alias, existing, range));
    }
    self
      .aliases
      .entry(file)
      .or_default()
      .insert(alias.to_string(), range.clone());
    Ok(())
  }

  /// The aliases registered for `file`, sorted.
  pub fn aliases(&self, file: FileId) -> BTreeSet<String> {
    self
      .aliases
      .get(&file)
      .map(|aliases| aliases.keys().cloned().collect())
      .unwrap_or_default()
  }

  fn duplicate(&self, name: &str, existing: &SourceRange, range: &SourceRange) -> DuplicateName {
    DuplicateName {
      name: name.to_string(),
      existing: existing.clone(),
      range: range.clone(),
    }
  }
}
