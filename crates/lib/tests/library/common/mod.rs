//! Shared helpers for library integration tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lake_lib::diagnostics::Diagnostics;
use lake_lib::eval::{Directory, evaluate_directory, load_directory, resolve_package};
use lake_lib::imports::{DirectoryImporter, NoImports};
use lake_lib::value::ResolvedValue;
use tempfile::TempDir;

/// A temporary import root. The directory being resolved is `main/`; every
/// other sub-directory is an importable package.
pub struct TestTree {
  pub temp: TempDir,
}

impl TestTree {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn main_dir(&self) -> PathBuf {
    self.root().join("main")
  }

  /// Write a file relative to the root, creating parent directories.
  pub fn write(&self, relative_path: &str, content: &str) -> &Self {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    self
  }

  /// Resolve `main/` with packages importable from the root.
  pub fn resolve(&self) -> Result<Directory, Diagnostics> {
    let mut importer = DirectoryImporter::new(self.root());
    evaluate_directory(&self.main_dir(), &mut importer)
  }

  /// Resolve `main/` as a package.
  pub fn resolve_values(&self) -> Result<BTreeMap<String, ResolvedValue>, Diagnostics> {
    let files = load_directory(&self.main_dir())?;
    resolve_package(&files, &mut DirectoryImporter::new(self.root()))
  }
}

/// Resolve a single Lakefile that imports nothing.
pub fn resolve_lakefile(src: &str) -> Result<Directory, Diagnostics> {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("Lakefile"), src).unwrap();
  evaluate_directory(temp.path(), &mut NoImports)
}

pub fn summaries(diags: &Diagnostics) -> Vec<String> {
  diags.iter().map(|diag| diag.summary.clone()).collect()
}

pub fn details(diags: &Diagnostics) -> Vec<String> {
  diags.iter().filter_map(|diag| diag.detail.clone()).collect()
}
