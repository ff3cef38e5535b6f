//! Defaults edge injection.
//!
//! Every vertex depends on the defaults except the defaults' own ancestors,
//! which would otherwise form a cycle through the defaults. Dependencies are
//! tracked per vertex, not per attribute: a value the defaults need is exempt
//! from every default, not only from the attributes that use it.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;
use tracing::debug;

use super::{DEFAULTS_VERTEX, DependencyGraph};

/// Vertices the defaults depend on, transitively, including the defaults.
pub fn ancestors(graph: &DependencyGraph) -> HashSet<NodeIndex> {
  let mut exempt = HashSet::new();
  let Some(start) = graph.index(DEFAULTS_VERTEX) else {
    return exempt;
  };
  let mut dfs = Dfs::new(graph.inner(), start);
  while let Some(idx) = dfs.next(graph.inner()) {
    exempt.insert(idx);
  }
  exempt
}

/// Add an edge to the defaults from every vertex outside its ancestry.
/// Returns the number of vertices that now depend on the defaults.
///
/// The graph must be acyclic.
pub fn propagate_defaults(graph: &mut DependencyGraph) -> usize {
  if !graph.contains(DEFAULTS_VERTEX) {
    return 0;
  }
  let exempt = ancestors(graph);
  let dependents: Vec<String> = graph
    .inner()
    .node_indices()
    .filter(|idx| !exempt.contains(idx))
    .map(|idx| graph.name(idx).to_string())
    .collect();

  for name in &dependents {
    graph.add_edge(name, DEFAULTS_VERTEX);
  }
  debug!(
    exempt = exempt.len(),
    dependents = dependents.len(),
    "propagated defaults"
  );
  dependents.len()
}
