//! Degree-based pruning of oversized graphs.

use std::collections::HashSet;
use std::fmt;

use log::warn;

use super::model::Graph;

/// Default upper bound on rendered stakeholders.
pub const MAX_NODES: usize = 20;

/// Non-fatal notice that a graph was pruned to its most connected nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Truncation {
	/// Node count before pruning.
	pub original_nodes: usize,
	/// Node count after pruning.
	pub kept_nodes: usize,
	/// Edge count before pruning.
	pub original_edges: usize,
	/// Edge count after pruning.
	pub kept_edges: usize,
}

impl fmt::Display for Truncation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Network is too large ({} nodes). Showing top {} most connected nodes.",
			self.original_nodes, self.kept_nodes
		)
	}
}

/// Output of [`reduce`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reduced {
	/// The bounded graph.
	pub graph: Graph,
	/// Present only when nodes were dropped.
	pub truncation: Option<Truncation>,
}

/// Keep the `max_nodes` highest-degree nodes and the edges between them.
///
/// Ties keep insertion order. A graph already within the bound comes back untouched.
pub fn reduce(graph: Graph, max_nodes: usize) -> Reduced {
	if graph.len() <= max_nodes {
		return Reduced {
			graph,
			truncation: None,
		};
	}

	let degrees = graph.degrees();
	let mut ranked: Vec<_> = graph.nodes().iter().collect();
	// sort_by is stable
	ranked.sort_by(|a, b| degrees[b.id.as_str()].cmp(&degrees[a.id.as_str()]));
	ranked.truncate(max_nodes);

	let kept: HashSet<&str> = ranked.iter().map(|n| n.id.as_str()).collect();
	let nodes: Vec<_> = ranked.into_iter().cloned().collect();
	let edges: Vec<_> = graph
		.edges()
		.iter()
		.filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
		.cloned()
		.collect();

	let truncation = Truncation {
		original_nodes: graph.len(),
		kept_nodes: nodes.len(),
		original_edges: graph.edges().len(),
		kept_edges: edges.len(),
	};
	warn!("{truncation}");

	Reduced {
		graph: Graph::from_parts(nodes, edges),
		truncation: Some(truncation),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::model::RawGraph;
	use serde_json::{Map, Value, json};

	/// Star-ish graph: node `s0` links to everyone, `s{i}` links to `s{i+1}` for even i.
	fn wide_graph(n: usize) -> Graph {
		let mut stakeholders = Map::new();
		for i in 0..n {
			stakeholders.insert(
				format!("s{i}"),
				json!({"name": format!("Stakeholder {i}"), "role": "role", "goals": []}),
			);
		}
		let mut relationships = Vec::new();
		for i in 1..n {
			relationships.push(json!({"from": "s0", "to": format!("s{i}"), "label": "works with"}));
			if i % 2 == 0 && i + 1 < n {
				relationships
					.push(json!({"from": format!("s{i}"), "to": format!("s{}", i + 1), "label": "asks"}));
			}
		}
		let raw = RawGraph::from_value(json!({
			"stakeholders": Value::Object(stakeholders),
			"relationships": relationships,
		}))
		.unwrap();
		Graph::from_raw(&raw).unwrap()
	}

	#[test]
	fn truncates_twenty_five_to_twenty() {
		let graph = wide_graph(25);
		let reduced = reduce(graph, MAX_NODES);

		assert_eq!(reduced.graph.len(), 20);
		let truncation = reduced.truncation.expect("should warn");
		assert_eq!(truncation.original_nodes, 25);
		assert!(truncation.to_string().contains("25 nodes"));

		let kept: HashSet<_> = reduced.graph.nodes().iter().map(|n| n.id.as_str()).collect();
		assert!(kept.contains("s0"));
		assert!(
			reduced
				.graph
				.edges()
				.iter()
				.all(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
		);
		assert_eq!(truncation.kept_edges, reduced.graph.edges().len());
	}

	#[test]
	fn highest_degree_first_with_stable_ties() {
		let reduced = reduce(wide_graph(25), MAX_NODES);
		let ids: Vec<_> = reduced.graph.nodes().iter().map(|n| n.id.as_str()).collect();
		// s0 has degree 24, s1 and s24 have degree 1, everyone else 2.
		assert_eq!(ids[0], "s0");
		assert_eq!(&ids[1..4], ["s2", "s3", "s4"]);
	}

	#[test]
	fn small_graphs_are_untouched() {
		let graph = wide_graph(5);
		let reduced = reduce(graph.clone(), MAX_NODES);
		assert_eq!(reduced.graph, graph);
		assert!(reduced.truncation.is_none());
	}

	#[test]
	fn reducing_twice_is_idempotent() {
		let once = reduce(wide_graph(30), MAX_NODES);
		let twice = reduce(once.graph.clone(), MAX_NODES);
		assert_eq!(twice.graph, once.graph);
		assert!(twice.truncation.is_none());
	}

	#[test]
	fn reduction_is_deterministic() {
		let a = reduce(wide_graph(40), MAX_NODES);
		let b = reduce(wide_graph(40), MAX_NODES);
		assert_eq!(a, b);
	}
}
