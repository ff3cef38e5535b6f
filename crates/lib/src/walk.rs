//! Dependency-ordered evaluation.
//!
//! The [`Evaluator`] owns the evaluation environment and every result. It
//! visits a vertex only after everything the vertex references is resolved,
//! one vertex at a time. Among vertices that are ready together, the one
//! declared first in source goes first, so output order is stable.
//!
//! The first vertex that fails stops the walk; nothing partial is returned.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashSet};

use hcl::Value;
use hcl::eval::{Context, Evaluate};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use thiserror::Error;
use tracing::{debug, trace};

use crate::builtins;
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::graph::{BuiltGraph, DEFAULTS_VERTEX, Declaration, SortKey};
use crate::imports::FileImports;
use crate::recipe::{Defaults, Recipe};
use crate::syntax::{AttrType, AttributeDecl, BlockDecl, FileId, RecipeKind, block_schema};
use crate::value::ResolvedValue;

/// Why an attribute could not be turned into a recipe or defaults field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
  #[error("An argument named \"{name}\" is not expected in {kind} blocks.")]
  Unsupported { name: String, kind: String },

  #[error("Inappropriate value for attribute \"{name}\": {expected} required, found {found}.")]
  Type {
    name: String,
    expected: &'static str,
    found: &'static str,
  },

  #[error("{0}")]
  Evaluation(String),
}

impl DecodeError {
  pub fn summary(&self) -> &'static str {
    match self {
      DecodeError::Unsupported { .. } => "Unsupported argument",
      DecodeError::Type { .. } => "Incorrect attribute value type",
      DecodeError::Evaluation(_) => "Evaluation failed",
    }
  }

  fn into_diagnostic(self, subject: &SourceRange) -> Diagnostic {
    Diagnostic::error(self.summary())
      .with_detail(self.to_string())
      .with_subject(subject.clone())
  }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
enum Field {
  Absent,
  String(String),
  Bool(bool),
  List(Vec<String>),
  Map(BTreeMap<String, String>),
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "tuple",
    Value::Object(_) => "object",
  }
}

fn scalar_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Convert an evaluated value into the declared attribute type. Numbers and
/// bools convert to strings, `"true"`/`"false"` convert to bools, and `null`
/// leaves the attribute unset.
fn decode(name: &str, value: &Value, ty: AttrType) -> Result<Field, DecodeError> {
  let mismatch = || DecodeError::Type {
    name: name.to_string(),
    expected: ty.describe(),
    found: type_name(value),
  };
  if value.is_null() {
    return Ok(Field::Absent);
  }

  match ty {
    AttrType::String => scalar_string(value).map(Field::String).ok_or_else(mismatch),
    AttrType::Bool => match value {
      Value::Bool(b) => Ok(Field::Bool(*b)),
      Value::String(s) if s == "true" => Ok(Field::Bool(true)),
      Value::String(s) if s == "false" => Ok(Field::Bool(false)),
      _ => Err(mismatch()),
    },
    AttrType::StringList => match value {
      Value::Array(items) => items
        .iter()
        .map(|item| scalar_string(item).ok_or_else(mismatch))
        .collect::<Result<Vec<_>, _>>()
        .map(Field::List),
      _ => Err(mismatch()),
    },
    AttrType::StringMap => match value {
      Value::Object(entries) => entries
        .iter()
        .map(|(key, item)| scalar_string(item).map(|s| (key.clone(), s)).ok_or_else(mismatch))
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Field::Map),
      _ => Err(mismatch()),
    },
  }
}

/// Per-vertex walk state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexState {
  Unvisited,
  InProgress,
  Resolved,
}

/// Everything a successful walk produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkOutput {
  /// Declared names and what they resolved to.
  pub values: BTreeMap<String, ResolvedValue>,
  pub stores: Vec<Recipe>,
  pub targets: Vec<Recipe>,
  pub defaults: Defaults,
  /// Vertex names in the order they were visited.
  pub order: Vec<String>,
}

/// Walks a built, acyclic graph.
pub struct Evaluator {
  /// One evaluation scope per file: its import aliases, the builtins, and
  /// every name resolved so far.
  scopes: Vec<Context<'static>>,
  output: WalkOutput,
  defaults_range: Option<SourceRange>,
  generated: Vec<Recipe>,
}

impl Evaluator {
  pub fn new(imports: &[FileImports]) -> Self {
    let scopes = imports
      .iter()
      .map(|file_imports| {
        let mut ctx = Context::new();
        for (alias, value) in &file_imports.bindings {
          ctx.declare_var(alias.as_str(), value.clone());
        }
        builtins::declare(&mut ctx);
        ctx
      })
      .collect();
    Self {
      scopes,
      output: WalkOutput::default(),
      defaults_range: None,
      generated: Vec::new(),
    }
  }

  /// Make a resolved name visible to every later evaluation.
  fn bind(&mut self, name: &str, value: Value) {
    for scope in &mut self.scopes {
      scope.declare_var(name, value.clone());
    }
  }

  /// Evaluate every vertex in dependency order.
  pub fn walk(mut self, built: &BuiltGraph<'_>) -> Result<WalkOutput, Diagnostics> {
    let graph = built.graph.inner();
    let mut state = vec![VertexState::Unvisited; graph.node_count()];
    let mut pending: Vec<usize> = graph
      .node_indices()
      .map(|idx| graph.neighbors_directed(idx, Direction::Outgoing).count())
      .collect();

    let mut ready: BinaryHeap<Reverse<(SortKey, NodeIndex)>> = graph
      .node_indices()
      .filter(|idx| pending[idx.index()] == 0)
      .map(|idx| Reverse((built.graph.sort_key(idx), idx)))
      .collect();

    while let Some(Reverse((_, idx))) = ready.pop() {
      if state[idx.index()] != VertexState::Unvisited {
        continue;
      }
      state[idx.index()] = VertexState::InProgress;
      let name = built.graph.name(idx);
      self.visit(built, name)?;
      state[idx.index()] = VertexState::Resolved;
      self.output.order.push(name.to_string());

      for dependent in graph.neighbors_directed(idx, Direction::Incoming) {
        pending[dependent.index()] -= 1;
        if pending[dependent.index()] == 0 {
          ready.push(Reverse((built.graph.sort_key(dependent), dependent)));
        }
      }
    }

    let unresolved: Vec<&str> = graph
      .node_indices()
      .filter(|idx| state[idx.index()] != VertexState::Resolved)
      .map(|idx| built.graph.name(idx))
      .collect();
    if !unresolved.is_empty() {
      return Err(
        Diagnostic::error("Circular reference")
          .with_detail(format!("Identifiers {} could not be ordered.", unresolved.join(", ")))
          .into(),
      );
    }

    let mut seen: HashSet<_> = HashSet::new();
    for recipe in std::mem::take(&mut self.generated) {
      if seen.insert(recipe.id.clone()) {
        self.output.stores.push(recipe);
      }
    }
    debug!(
      stores = self.output.stores.len(),
      targets = self.output.targets.len(),
      values = self.output.values.len(),
      "walk complete"
    );
    Ok(self.output)
  }

  fn visit(&mut self, built: &BuiltGraph<'_>, name: &str) -> Result<(), Diagnostics> {
    match built.declaration(name) {
      Some(Declaration::Defaults) => {
        for &(file, block) in &built.defaults {
          self.visit_defaults(file, block)?;
        }
        Ok(())
      }
      Some(&Declaration::Recipe { kind, block, file }) => self.visit_recipe(name, kind, file, block),
      Some(&Declaration::Value { attribute, file }) => self.visit_value(name, file, attribute),
      None => {
        trace!(name = %name, "undeclared reference");
        Ok(())
      }
    }
  }

  fn visit_defaults(&mut self, file: FileId, block: &BlockDecl) -> Result<(), Diagnostics> {
    trace!(name = DEFAULTS_VERTEX, file, "resolving defaults");
    let mut defaults = Defaults::default();
    for (attribute, field) in self.decode_block(file, block)? {
      if let ("shell", Field::List(shell)) = (attribute, field) {
        defaults.shell = shell;
      }
    }

    if let Some(range) = &self.defaults_range
      && !self.output.defaults.is_empty()
      && !defaults.is_empty()
      && self.output.defaults != defaults
    {
      return Err(
        Diagnostic::error("Conflicting defaults")
          .with_detail(format!(
            "Defaults were already set at {range} with a different value. A directory may have only one effective set of defaults."
          ))
          .with_subject(block.def_range.clone())
          .with_context(block.range.clone())
          .into(),
      );
    }
    if self.output.defaults.is_empty() && !defaults.is_empty() {
      self.output.defaults = defaults;
      self.defaults_range = Some(block.def_range.clone());
    }
    Ok(())
  }

  fn visit_recipe(&mut self, name: &str, kind: RecipeKind, file: FileId, block: &BlockDecl) -> Result<(), Diagnostics> {
    let mut recipe = Recipe::new(name, kind);
    for (attribute, field) in self.decode_block(file, block)? {
      match (attribute, field) {
        ("env", Field::Map(env)) => recipe.env = env,
        ("inputs", Field::List(inputs)) => recipe.inputs = inputs,
        ("network", Field::Bool(network)) => recipe.network = network,
        ("script", Field::String(script)) => recipe.script = script,
        ("shell", Field::List(shell)) => recipe.shell = shell,
        _ => {}
      }
    }
    self.output.defaults.apply(&mut recipe);

    let recipe = recipe.seal().map_err(|err| {
      Diagnostics::from(
        Diagnostic::error("Evaluation failed")
          .with_detail(err.to_string())
          .with_subject(block.def_range.clone())
          .with_context(block.range.clone()),
      )
    })?;
    debug!(name = %name, kind = %kind, id = %recipe.id, "resolved recipe");

    self.bind(name, Value::String(recipe.token()));
    match kind {
      RecipeKind::Store => self.output.stores.push(recipe.clone()),
      RecipeKind::Target => self.output.targets.push(recipe.clone()),
    }
    self.output.values.insert(name.to_string(), ResolvedValue::Recipe(recipe));
    Ok(())
  }

  fn visit_value(&mut self, name: &str, file: FileId, attribute: &AttributeDecl) -> Result<(), Diagnostics> {
    let value = self
      .evaluate(file, &attribute.expr)
      .map_err(|err| Diagnostics::from(err.into_diagnostic(&attribute.expr_range).with_context(attribute.range.clone())))?;
    trace!(name = %name, "resolved value");
    self.bind(name, value.clone());
    self.output.values.insert(name.to_string(), ResolvedValue::Value(value));
    Ok(())
  }

  /// Evaluate and decode every attribute of a block against its schema.
  /// All attribute errors of the block are reported together.
  fn decode_block<'b>(&mut self, file: FileId, block: &'b BlockDecl) -> Result<Vec<(&'b str, Field)>, Diagnostics> {
    let mut fields = Vec::new();
    let mut diags = Diagnostics::new();
    let schema = block_schema(&block.kind);

    for attribute in &block.attributes {
      let Some(spec) = schema.and_then(|schema| schema.attribute(&attribute.name)) else {
        diags.push(
          DecodeError::Unsupported {
            name: attribute.name.clone(),
            kind: block.kind.clone(),
          }
          .into_diagnostic(&attribute.range),
        );
        continue;
      };
      let decoded = self
        .evaluate(file, &attribute.expr)
        .and_then(|value| decode(&attribute.name, &value, spec.ty));
      match decoded {
        Ok(field) => fields.push((attribute.name.as_str(), field)),
        Err(err) => diags.push(err.into_diagnostic(&attribute.expr_range)),
      }
    }

    let diags = diags.with_context(&block.range);
    diags.into_result(fields)
  }

  /// Evaluate one expression in the scope of `file`.
  fn evaluate(&mut self, file: FileId, expr: &hcl::Expression) -> Result<Value, DecodeError> {
    let ctx = self
      .scopes
      .get(file)
      .ok_or_else(|| DecodeError::Evaluation(format!("no evaluation scope for file {file}")))?;
    let (result, generated) = builtins::collect(|| expr.evaluate(ctx));
    let value = result.map_err(|err| DecodeError::Evaluation(err.to_string()))?;
    self.generated.extend(generated);
    Ok(value)
  }
}
