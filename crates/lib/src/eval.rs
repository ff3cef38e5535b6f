//! Directory resolution.
//!
//! Ties the phases together:
//!
//! 1. Resolve imports (any failure stops here)
//! 2. Register names and build the dependency graph
//! 3. Reject circular references
//! 4. Make declarations depend on the directory defaults
//! 5. Walk the graph, evaluating each declaration once
//!
//! Name and cycle errors are batched; import and evaluation errors stop
//! resolution at the phase that produced them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{self, cycles, defaults};
use crate::imports::{ImportFunction, resolve_imports};
use crate::recipe::{Defaults, Recipe};
use crate::syntax::{SourceFile, parse_source};
use crate::value::ResolvedValue;
use crate::walk::{Evaluator, WalkOutput};

/// Base name of a directory's main file; others are named `*.Lakefile`.
pub const LAKEFILE: &str = "Lakefile";

/// A resolved directory: recipes grouped by kind plus its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Directory {
  pub stores: Vec<Recipe>,
  pub targets: Vec<Recipe>,
  pub defaults: Defaults,
}

impl From<WalkOutput> for Directory {
  fn from(output: WalkOutput) -> Self {
    Self {
      stores: output.stores,
      targets: output.targets,
      defaults: output.defaults,
    }
  }
}

/// Run every phase over parsed files.
pub fn resolve(files: &[SourceFile], importer: &mut dyn ImportFunction) -> Result<WalkOutput, Diagnostics> {
  let imports = resolve_imports(files, importer)?;
  let mut built = graph::build(files, &imports)?;
  cycles::detect_cycles(&built)?;
  defaults::propagate_defaults(&mut built.graph);
  let output = Evaluator::new(&imports).walk(&built)?;
  info!(
    files = files.len(),
    stores = output.stores.len(),
    targets = output.targets.len(),
    "resolved directory"
  );
  Ok(output)
}

/// Resolve files into stores, targets and defaults.
pub fn resolve_directory(files: &[SourceFile], importer: &mut dyn ImportFunction) -> Result<Directory, Diagnostics> {
  resolve(files, importer).map(Directory::from)
}

/// Resolve files as a package another directory imports: every declared
/// name and its value.
pub fn resolve_package(
  files: &[SourceFile],
  importer: &mut dyn ImportFunction,
) -> Result<BTreeMap<String, ResolvedValue>, Diagnostics> {
  resolve(files, importer).map(|output| output.values)
}

/// Whether `name` is a file a directory is made of.
pub fn is_lakefile(name: &str) -> bool {
  name == LAKEFILE || (name.len() > LAKEFILE.len() + 1 && name.ends_with(".Lakefile"))
}

/// Read and parse every Lakefile directly inside `path`, sorted by name.
pub fn load_directory(path: &Path) -> Result<Vec<SourceFile>, Diagnostics> {
  let mut files = Vec::new();
  let mut diags = Diagnostics::new();

  for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
    let entry = match entry {
      Ok(entry) => entry,
      Err(err) => {
        diags.push(
          Diagnostic::error("Failed to read directory").with_detail(format!("{}: {}", path.display(), err)),
        );
        continue;
      }
    };
    let is_source = entry.file_type().is_file() && entry.file_name().to_str().is_some_and(is_lakefile);
    if !is_source {
      continue;
    }

    let filename = entry.path().display().to_string();
    match std::fs::read_to_string(entry.path()) {
      Ok(src) => match parse_source(&src, &filename) {
        Ok(file) => files.push(file),
        Err(errs) => diags.extend(errs),
      },
      Err(err) => diags.push(Diagnostic::error("Failed to read file").with_detail(format!("{filename}: {err}"))),
    }
  }

  debug!(dir = %path.display(), files = files.len(), "loaded directory");
  diags.into_result(files)
}

/// Load and resolve a directory.
pub fn evaluate_directory(path: &Path, importer: &mut dyn ImportFunction) -> Result<Directory, Diagnostics> {
  let files = load_directory(path)?;
  resolve_directory(&files, importer)
}
