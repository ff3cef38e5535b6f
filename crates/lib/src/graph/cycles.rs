//! Circular reference detection.
//!
//! Every strongly connected component with more than one vertex, and every
//! vertex that references itself, is reported as one cycle.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use tracing::debug;

use super::{BuiltGraph, DependencyGraph};
use crate::diagnostics::{Diagnostic, Diagnostics};

/// All cycles in the graph. Each path starts at the member that comes first
/// in source order and ends with that member again, e.g. `[a, b, a]`.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
  let inner = graph.inner();
  let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(inner)
    .into_iter()
    .filter(|component| component.len() > 1 || inner.contains_edge(component[0], component[0]))
    .map(|component| traversal_path(graph, &component))
    .collect();
  cycles.sort_by_key(|path| graph.sort_key(path[0]));

  cycles
    .into_iter()
    .map(|path| path.into_iter().map(|idx| graph.name(idx).to_string()).collect())
    .collect()
}

/// A closed walk over the component: from its earliest member, repeatedly
/// follow the shortest chain of references to the nearest member not yet
/// named, then back to the start. Every arrow is a real reference.
fn traversal_path(graph: &DependencyGraph, component: &[NodeIndex]) -> Vec<NodeIndex> {
  let members: HashSet<NodeIndex> = component.iter().copied().collect();
  let Some(&start) = component.iter().min_by_key(|&&idx| graph.sort_key(idx)) else {
    return Vec::new();
  };
  if component.len() == 1 {
    return vec![start, start];
  }

  let mut path = vec![start];
  let mut named: HashSet<NodeIndex> = HashSet::from([start]);
  let mut current = start;
  while named.len() < members.len() {
    let Some(hop) = shortest_path(graph, &members, current, |idx| !named.contains(&idx)) else {
      break;
    };
    named.extend(hop.iter().copied());
    current = *hop.last().unwrap_or(&current);
    path.extend(hop);
  }
  if let Some(back) = shortest_path(graph, &members, current, |idx| idx == start) {
    path.extend(back);
  }
  path
}

/// Breadth-first search within `members`, following references in source
/// order. Returns the vertices after `from` up to the first one matching
/// `target`.
fn shortest_path(
  graph: &DependencyGraph,
  members: &HashSet<NodeIndex>,
  from: NodeIndex,
  target: impl Fn(NodeIndex) -> bool,
) -> Option<Vec<NodeIndex>> {
  let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
  let mut queue = VecDeque::from([from]);
  while let Some(idx) = queue.pop_front() {
    let mut next: Vec<NodeIndex> = graph
      .inner()
      .neighbors_directed(idx, Direction::Outgoing)
      .filter(|n| members.contains(n))
      .collect();
    next.sort_by_key(|&n| graph.sort_key(n));
    for n in next {
      if n != from && parent.contains_key(&n) {
        continue;
      }
      if target(n) {
        let mut hop = vec![n];
        let mut at = idx;
        while at != from {
          hop.push(at);
          at = parent[&at];
        }
        hop.reverse();
        return Some(hop);
      }
      if n != from {
        parent.insert(n, idx);
        queue.push_back(n);
      }
    }
  }
  None
}

/// Report every cycle. Each diagnostic points at the first member's
/// declaration.
pub fn detect_cycles(built: &BuiltGraph<'_>) -> Result<(), Diagnostics> {
  let cycles = find_cycles(&built.graph);
  if !cycles.is_empty() {
    debug!(count = cycles.len(), "circular references found");
  }

  cycles
    .into_iter()
    .map(|path| {
      let mut diag = Diagnostic::error("Circular reference")
        .with_detail(format!("Identifiers {} create a circular reference.", path.join(" -> ")));
      if let Some((subject, context)) = built.location(&path[0]) {
        diag = diag.with_subject(subject.clone()).with_context(context.clone());
      }
      diag
    })
    .collect::<Diagnostics>()
    .into_result(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn graph(decls: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (byte, name) in decls.iter().enumerate() {
      graph.declare(name, 0, byte);
    }
    for (from, to) in edges {
      graph.add_edge(from, to);
    }
    graph
  }

  #[test]
  fn acyclic_graph_has_no_cycles() {
    let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
    assert!(find_cycles(&g).is_empty());
  }

  #[test]
  fn two_cycle() {
    let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
    assert_eq!(find_cycles(&g), vec![vec!["a", "b", "a"]]);
  }

  #[test]
  fn path_starts_at_earliest_declaration() {
    let g = graph(&["x", "y", "z"], &[("z", "y"), ("y", "x"), ("x", "z")]);
    assert_eq!(find_cycles(&g), vec![vec!["x", "z", "y", "x"]]);
  }

  #[test]
  fn every_arrow_is_a_reference() {
    // a references b and c; b and c each reference a.
    let g = graph(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("b", "a"), ("c", "a")]);
    let cycles = find_cycles(&g);
    assert_eq!(cycles, vec![vec!["a", "b", "a", "c", "a"]]);
    for pair in cycles[0].windows(2) {
      assert!(g.has_edge(&pair[0], &pair[1]));
    }
  }

  #[test]
  fn self_reference() {
    let g = graph(&["a"], &[("a", "a")]);
    assert_eq!(find_cycles(&g), vec![vec!["a", "a"]]);
  }

  #[test]
  fn independent_cycles_are_all_found() {
    let g = graph(
      &["a", "b", "c", "d", "e"],
      &[("a", "b"), ("b", "a"), ("c", "d"), ("d", "c"), ("e", "a")],
    );
    assert_eq!(find_cycles(&g), vec![vec!["a", "b", "a"], vec!["c", "d", "c"]]);
  }
}
