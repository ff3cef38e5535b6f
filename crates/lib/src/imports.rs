//! Import resolution.
//!
//! A file may begin with one `import` attribute:
//!
//! ```hcl
//! import = ["tools/fish", { carp = "tools/carp" }]
//! ```
//!
//! or, equivalently for aliased imports only:
//!
//! ```hcl
//! import = { carp = "tools/carp" }
//! ```
//!
//! A bare package string is bound under the last `/` segment of its name.
//! Each alias is visible only in the file that declares it, as an object of
//! the package's exported values. Packages are loaded through an injected
//! [`ImportFunction`], at most once per package name per resolution.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use hcl::eval::{Context, Evaluate};
use tracing::{debug, trace};

use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::eval;
use crate::references::free_variables;
use crate::syntax::{AttributeDecl, IMPORT_ATTRIBUTE, SourceFile};
use crate::value::ResolvedValue;

/// Loads a package by name and returns its resolved values.
pub trait ImportFunction {
  fn load_package(&mut self, name: &str) -> Result<BTreeMap<String, ResolvedValue>, Diagnostics>;
}

impl<F> ImportFunction for F
where
  F: FnMut(&str) -> Result<BTreeMap<String, ResolvedValue>, Diagnostics>,
{
  fn load_package(&mut self, name: &str) -> Result<BTreeMap<String, ResolvedValue>, Diagnostics> {
    self(name)
  }
}

/// An importer for directories that must not import anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImports;

impl ImportFunction for NoImports {
  fn load_package(&mut self, name: &str) -> Result<BTreeMap<String, ResolvedValue>, Diagnostics> {
    Err(
      Diagnostic::error("Imports unavailable")
        .with_detail(format!("Cannot load package \"{name}\": no import root is configured."))
        .into(),
    )
  }
}

/// Resolves package `a/b` as the directory `<root>/a/b`, evaluated as a
/// library. Nested imports resolve against the same root.
#[derive(Debug, Clone)]
pub struct DirectoryImporter {
  root: PathBuf,
  stack: Vec<String>,
}

impl DirectoryImporter {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      stack: Vec::new(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn package_dir(&self, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let valid = !name.is_empty() && relative.components().all(|c| matches!(c, Component::Normal(_)));
    valid.then(|| self.root.join(relative))
  }
}

impl ImportFunction for DirectoryImporter {
  fn load_package(&mut self, name: &str) -> Result<BTreeMap<String, ResolvedValue>, Diagnostics> {
    if self.stack.iter().any(|loading| loading == name) {
      let chain = self.stack.join(" -> ");
      return Err(
        Diagnostic::error("Import cycle")
          .with_detail(format!("Package \"{name}\" imports itself through {chain} -> {name}."))
          .into(),
      );
    }

    let Some(dir) = self.package_dir(name) else {
      return Err(
        Diagnostic::error("Invalid package name")
          .with_detail(format!("\"{name}\" must be a relative path without \".\" or \"..\" segments."))
          .into(),
      );
    };
    if !dir.is_dir() {
      return Err(
        Diagnostic::error("Package not found")
          .with_detail(format!("No package directory at {}.", dir.display()))
          .into(),
      );
    }

    debug!(package = %name, dir = %dir.display(), "resolving package directory");
    self.stack.push(name.to_string());
    let result = eval::load_directory(&dir).and_then(|files| eval::resolve_package(&files, self));
    self.stack.pop();
    result
  }
}

/// One `alias = package` entry of an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
  pub alias: String,
  pub package: String,
  pub range: SourceRange,
}

/// The imports of one file and the values bound under each alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileImports {
  pub imports: Vec<Import>,
  pub bindings: BTreeMap<String, hcl::Value>,
}

/// Whether an imported value is visible to the importer.
pub fn is_exported(name: &str) -> bool {
  !(name.starts_with('_') || name.starts_with("./"))
}

/// Turn a package's values into the object bound under an alias.
pub fn exports(values: &BTreeMap<String, ResolvedValue>) -> hcl::Value {
  hcl::Value::Object(
    values
      .iter()
      .filter(|(name, _)| is_exported(name))
      .map(|(name, value)| (name.clone(), value.to_hcl_value()))
      .collect(),
  )
}

/// Parse every file's import declaration and load the packages they name.
///
/// Returns one [`FileImports`] per file, in file order. Any failure is
/// returned before anything is loaded (declaration errors) or after every
/// distinct package has been tried (load errors).
pub fn resolve_imports(
  files: &[SourceFile],
  importer: &mut dyn ImportFunction,
) -> Result<Vec<FileImports>, Diagnostics> {
  let mut diags = Diagnostics::new();
  let mut declared = Vec::with_capacity(files.len());
  for file in files {
    match file_imports(file) {
      Ok(imports) => declared.push(imports),
      Err(errs) => diags.extend(errs),
    }
  }
  let declared = diags.into_result(declared)?;

  let mut cache: HashMap<String, Option<hcl::Value>> = HashMap::new();
  let mut diags = Diagnostics::new();
  let mut resolved = Vec::with_capacity(declared.len());
  for imports in declared {
    let mut bindings = BTreeMap::new();
    for import in &imports {
      if !cache.contains_key(&import.package) {
        debug!(package = %import.package, "loading package");
        let loaded = match importer.load_package(&import.package) {
          Ok(values) => Some(exports(&values)),
          Err(errs) => {
            diags.extend(package_errors(errs, import));
            None
          }
        };
        cache.insert(import.package.clone(), loaded);
      } else {
        trace!(package = %import.package, alias = %import.alias, "package already loaded");
      }
      if let Some(Some(value)) = cache.get(&import.package) {
        bindings.entry(import.alias.clone()).or_insert_with(|| value.clone());
      }
    }
    resolved.push(FileImports { imports, bindings });
  }
  diags.into_result(resolved)
}

fn package_errors(errs: Diagnostics, import: &Import) -> Diagnostics {
  if errs.is_empty() {
    return Diagnostic::error("Import failed")
      .with_detail(format!("Package \"{}\" could not be loaded.", import.package))
      .with_subject(import.range.clone())
      .into();
  }
  errs
    .into_iter()
    .map(|diag| match diag.subject {
      Some(_) => diag,
      None => diag.with_subject(import.range.clone()),
    })
    .collect::<Diagnostics>()
    .with_context(&import.range)
}

/// The parsed import declaration of one file.
fn file_imports(file: &SourceFile) -> Result<Vec<Import>, Diagnostics> {
  let mut decls = file.attributes.iter().filter(|attr| attr.name == IMPORT_ATTRIBUTE);
  let Some(decl) = decls.next() else {
    return Ok(Vec::new());
  };

  let mut diags = Diagnostics::new();
  for extra in decls {
    diags.push(
      Diagnostic::error("Duplicate import declaration")
        .with_detail(format!(
          "Imports were already declared at {}. A file may contain only one import declaration.",
          decl.range
        ))
        .with_subject(extra.range.clone()),
    );
  }

  let line = decl.range.start.line;
  let earlier = file
    .attributes
    .iter()
    .filter(|attr| attr.name != IMPORT_ATTRIBUTE)
    .map(|attr| &attr.range)
    .chain(file.blocks.iter().map(|block| &block.range))
    .any(|range| range.start.line < line);
  if earlier {
    diags.push(
      Diagnostic::error("Invalid import location")
        .with_detail("The import declaration must be the first declaration in the file.")
        .with_subject(decl.range.clone()),
    );
  }

  let variables = free_variables(&decl.expr, &Default::default());
  if !variables.is_empty() {
    diags.push(
      Diagnostic::error("Variables not allowed")
        .with_detail(format!(
          "Import declarations cannot reference other values; found {}.",
          variables.join(", ")
        ))
        .with_subject(decl.expr_range.clone()),
    );
    return Err(diags);
  }

  match parse_declaration(decl) {
    Ok(imports) => diags.into_result(imports),
    Err(diag) => {
      diags.push(diag);
      Err(diags)
    }
  }
}

fn invalid(decl: &AttributeDecl, detail: impl Into<String>) -> Diagnostic {
  Diagnostic::error("Invalid import declaration")
    .with_detail(detail)
    .with_subject(decl.expr_range.clone())
}

fn parse_declaration(decl: &AttributeDecl) -> Result<Vec<Import>, Diagnostic> {
  let value = decl
    .expr
    .evaluate(&Context::new())
    .map_err(|err| invalid(decl, err.to_string()))?;

  let entry = |alias: &str, package: &hcl::Value| -> Result<Import, Diagnostic> {
    match package.as_str() {
      Some(package) => Ok(Import {
        alias: alias.to_string(),
        package: package.to_string(),
        range: decl.range.clone(),
      }),
      None => Err(invalid(decl, format!("The package for \"{alias}\" must be a string."))),
    }
  };
  let bare = |package: &str| -> Import {
    let alias = package.rsplit('/').next().unwrap_or(package);
    Import {
      alias: alias.to_string(),
      package: package.to_string(),
      range: decl.range.clone(),
    }
  };

  match &value {
    hcl::Value::String(package) => Ok(vec![bare(package.as_str())]),
    hcl::Value::Object(entries) => entries
      .iter()
      .map(|(alias, package)| entry(alias.as_str(), package))
      .collect(),
    hcl::Value::Array(items) => {
      let mut imports = Vec::new();
      for item in items {
        match item {
          hcl::Value::String(package) => imports.push(bare(package.as_str())),
          hcl::Value::Object(entries) => {
            for (alias, package) in entries {
              imports.push(entry(alias.as_str(), package)?);
            }
          }
          _ => {
            return Err(invalid(
              decl,
              "Each import must be a package name or an { alias = \"package\" } object.",
            ));
          }
        }
      }
      Ok(imports)
    }
    _ => Err(invalid(
      decl,
      "Imports must be a list of package names or an object of aliases.",
    )),
  }
}
