//! Dependency graph of declarations.
//!
//! Vertices are declaration names. An edge `a -> b` means `a` references `b`
//! and must be evaluated after it. Names that are referenced but never
//! declared still get a vertex (compound `alias.attr` references among them),
//! so the evaluator sees every name an expression needs.
//!
//! # Phases
//!
//! 1. [`build`]: register names, add a vertex per declaration and an edge per
//!    free variable
//! 2. [`cycles::detect_cycles`]: reject circular references
//! 3. [`defaults::propagate_defaults`]: make everything outside the
//!    defaults' own ancestry depend on the defaults

pub mod cycles;
pub mod defaults;

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace};

use crate::diagnostics::{Diagnostics, SourceRange};
use crate::imports::FileImports;
use crate::names::NameRegistry;
use crate::references::free_variables;
use crate::syntax::{
  AttributeDecl, BlockDecl, DEFAULTS_BLOCK, FileId, IMPORT_ATTRIBUTE, RecipeKind, SourceFile, block_schema,
};

/// Vertex name of the directory defaults. Not a valid identifier, so no
/// declaration can collide with it.
pub const DEFAULTS_VERTEX: &str = "@defaults";

/// Walk priority of a vertex. Declared vertices come first in source order,
/// then undeclared references by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
  Declared { file: FileId, byte: usize },
  Undeclared { name: String },
}

/// What a vertex stands for.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
  Recipe {
    kind: RecipeKind,
    block: &'a BlockDecl,
    file: FileId,
  },
  Value {
    attribute: &'a AttributeDecl,
    file: FileId,
  },
  Defaults,
}

/// Name-indexed arena of declarations and their references.
#[derive(Debug, Default)]
pub struct DependencyGraph {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
  order: HashMap<NodeIndex, (FileId, usize)>,
}

impl DependencyGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get or create the vertex for `name`.
  pub fn add_vertex(&mut self, name: &str) -> NodeIndex {
    if let Some(&idx) = self.nodes.get(name) {
      return idx;
    }
    let idx = self.graph.add_node(name.to_string());
    self.nodes.insert(name.to_string(), idx);
    idx
  }

  /// Record where `name` is declared. The earliest position wins.
  pub fn declare(&mut self, name: &str, file: FileId, byte: usize) -> NodeIndex {
    let idx = self.add_vertex(name);
    let position = self.order.entry(idx).or_insert((file, byte));
    if (file, byte) < *position {
      *position = (file, byte);
    }
    idx
  }

  /// Add `from -> to`, creating either vertex if needed. Repeated edges
  /// are stored once.
  pub fn add_edge(&mut self, from: &str, to: &str) {
    let from = self.add_vertex(from);
    let to = self.add_vertex(to);
    self.graph.update_edge(from, to, ());
  }

  pub fn index(&self, name: &str) -> Option<NodeIndex> {
    self.nodes.get(name).copied()
  }

  pub fn name(&self, idx: NodeIndex) -> &str {
    &self.graph[idx]
  }

  pub fn contains(&self, name: &str) -> bool {
    self.nodes.contains_key(name)
  }

  pub fn has_edge(&self, from: &str, to: &str) -> bool {
    match (self.index(from), self.index(to)) {
      (Some(from), Some(to)) => self.graph.contains_edge(from, to),
      _ => false,
    }
  }

  pub fn vertex_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  pub fn sort_key(&self, idx: NodeIndex) -> SortKey {
    match self.order.get(&idx) {
      Some(&(file, byte)) => SortKey::Declared { file, byte },
      None => SortKey::Undeclared {
        name: self.graph[idx].clone(),
      },
    }
  }

  /// Names `name` references directly, in walk priority order.
  pub fn dependencies(&self, name: &str) -> Vec<&str> {
    let Some(idx) = self.index(name) else {
      return Vec::new();
    };
    let mut deps: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Outgoing).collect();
    deps.sort_by_key(|&dep| self.sort_key(dep));
    deps.into_iter().map(|dep| self.name(dep)).collect()
  }

  pub(crate) fn inner(&self) -> &DiGraph<String, ()> {
    &self.graph
  }
}

/// The graph together with the declaration behind each declared vertex.
#[derive(Debug)]
pub struct BuiltGraph<'a> {
  pub graph: DependencyGraph,
  pub declarations: HashMap<String, Declaration<'a>>,
  /// Every defaults block, in source order.
  pub defaults: Vec<(FileId, &'a BlockDecl)>,
}

impl BuiltGraph<'_> {
  pub fn declaration(&self, name: &str) -> Option<&Declaration<'_>> {
    self.declarations.get(name)
  }

  /// Subject and context ranges for a diagnostic about `name`: the header
  /// and the whole declaration.
  pub fn location(&self, name: &str) -> Option<(&SourceRange, &SourceRange)> {
    match self.declarations.get(name)? {
      Declaration::Recipe { block, .. } => Some((&block.def_range, &block.range)),
      Declaration::Value { attribute, .. } => Some((&attribute.range, &attribute.range)),
      Declaration::Defaults => self.defaults.first().map(|(_, block)| (&block.def_range, &block.range)),
    }
  }
}

/// One declaration of a file, before it is placed in the graph.
enum Item<'a> {
  Attribute(&'a AttributeDecl),
  Block(&'a BlockDecl),
}

impl Item<'_> {
  fn byte(&self) -> usize {
    match self {
      Item::Attribute(attr) => attr.range.start.byte,
      Item::Block(block) => block.range.start.byte,
    }
  }
}

/// Register every name and build the dependency graph.
///
/// Duplicate names are reported together once every declaration has been
/// seen.
pub fn build<'a>(files: &'a [SourceFile], imports: &[FileImports]) -> Result<BuiltGraph<'a>, Diagnostics> {
  let mut registry = NameRegistry::new();
  let mut diags = Diagnostics::new();

  for (file, file_imports) in imports.iter().enumerate() {
    for import in &file_imports.imports {
      if let Err(err) = registry.register_alias(file, &import.alias, &import.range) {
        diags.push(err.into());
      }
    }
  }

  let mut built = BuiltGraph {
    graph: DependencyGraph::new(),
    declarations: HashMap::new(),
    defaults: Vec::new(),
  };

  for (file, source) in files.iter().enumerate() {
    let aliases = registry.aliases(file);

    let mut items: Vec<Item<'a>> = source
      .attributes
      .iter()
      .filter(|attr| attr.name != IMPORT_ATTRIBUTE)
      .map(Item::Attribute)
      .chain(source.blocks.iter().map(Item::Block))
      .collect();
    items.sort_by_key(Item::byte);

    for item in items {
      match item {
        Item::Attribute(attribute) => {
          if let Err(err) = registry.register_global(&attribute.name, &attribute.range) {
            diags.push(err.into());
            continue;
          }
          built.graph.declare(&attribute.name, file, attribute.range.start.byte);
          built
            .declarations
            .insert(attribute.name.clone(), Declaration::Value { attribute, file });
          for reference in free_variables(&attribute.expr, &aliases) {
            trace!(from = %attribute.name, to = %reference, "reference");
            built.graph.add_edge(&attribute.name, &reference);
          }
        }
        Item::Block(block) if block.kind == DEFAULTS_BLOCK => {
          built.graph.declare(DEFAULTS_VERTEX, file, block.range.start.byte);
          built.declarations.insert(DEFAULTS_VERTEX.to_string(), Declaration::Defaults);
          built.defaults.push((file, block));
          add_block_references(&mut built.graph, DEFAULTS_VERTEX, block, &aliases);
        }
        Item::Block(block) => {
          let (Some(kind), Some(name)) = (RecipeKind::from_block_kind(&block.kind), block.name()) else {
            continue;
          };
          if let Err(err) = registry.register_global(name, &block.def_range) {
            diags.push(err.into());
            continue;
          }
          built.graph.declare(name, file, block.range.start.byte);
          built
            .declarations
            .insert(name.to_string(), Declaration::Recipe { kind, block, file });
          add_block_references(&mut built.graph, name, block, &aliases);
        }
      }
    }
  }

  debug!(
    vertices = built.graph.vertex_count(),
    edges = built.graph.edge_count(),
    "built dependency graph"
  );
  diags.into_result(built)
}

/// Add edges for the references of the attributes the block kind accepts.
fn add_block_references(graph: &mut DependencyGraph, from: &str, block: &BlockDecl, aliases: &BTreeSet<String>) {
  graph.add_vertex(from);
  let Some(schema) = block_schema(&block.kind) else {
    return;
  };
  for attribute in &block.attributes {
    if schema.attribute(&attribute.name).is_none() {
      continue;
    }
    for reference in free_variables(&attribute.expr, aliases) {
      trace!(from = %from, to = %reference, "reference");
      graph.add_edge(from, &reference);
    }
  }
}
