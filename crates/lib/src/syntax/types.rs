use serde::Serialize;

use crate::diagnostics::SourceRange;

/// Index of a file within the set being resolved.
pub type FileId = usize;

/// A top-level or block-level `name = expression` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
  pub name: String,
  pub expr: hcl::Expression,
  /// The whole `name = expression` span.
  pub range: SourceRange,
  /// The expression span only.
  pub expr_range: SourceRange,
}

/// A `kind "label" { ... }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDecl {
  pub kind: String,
  pub labels: Vec<String>,
  pub attributes: Vec<AttributeDecl>,
  /// The block header, `kind "label"`.
  pub def_range: SourceRange,
  /// The whole block including its body.
  pub range: SourceRange,
}

impl BlockDecl {
  /// The declared name of a labelled block.
  pub fn name(&self) -> Option<&str> {
    self.labels.first().map(String::as_str)
  }
}

/// One parsed source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
  pub name: String,
  pub blocks: Vec<BlockDecl>,
  pub attributes: Vec<AttributeDecl>,
}

impl SourceFile {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }
}

/// The kind of a recipe block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeKind {
  Store,
  Target,
}

impl RecipeKind {
  pub fn from_block_kind(kind: &str) -> Option<Self> {
    match kind {
      STORE_BLOCK => Some(RecipeKind::Store),
      TARGET_BLOCK => Some(RecipeKind::Target),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      RecipeKind::Store => STORE_BLOCK,
      RecipeKind::Target => TARGET_BLOCK,
    }
  }
}

impl std::fmt::Display for RecipeKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

pub const STORE_BLOCK: &str = "store";
pub const TARGET_BLOCK: &str = "target";
pub const DEFAULTS_BLOCK: &str = "defaults";

/// Name of the top-level attribute that declares a file's imports.
pub const IMPORT_ATTRIBUTE: &str = "import";
