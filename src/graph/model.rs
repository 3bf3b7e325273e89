//! Stakeholder graph: raw graph-source schemas and their validation.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Validation failures for raw graph-source payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
	/// A stakeholder entry lacks a name or role, or its goals are not a list of strings.
	#[error("stakeholder `{id}` is malformed: {reason}")]
	MalformedStakeholder {
		/// Key of the entry in the stakeholder map.
		id: String,
		/// Which requirement failed.
		reason: &'static str,
	},

	/// A relationship record lacks one of its fields.
	#[error("relationship #{index} is missing `{field}`")]
	MalformedRelationship {
		/// Position in the relationship list.
		index: usize,
		/// Name of the missing field.
		field: &'static str,
	},

	/// A relationship points at a stakeholder id that does not exist.
	#[error("relationship #{index} references unknown stakeholder `{id}`")]
	DanglingReference {
		/// Position in the relationship list.
		index: usize,
		/// The unknown id.
		id: String,
	},
}

/// Stakeholder record as sent by the graph source.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawStakeholder {
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Job role.
	#[serde(default)]
	pub role: Option<String>,
	/// Must be a list of strings; kept loose so validation can name the failure.
	#[serde(default)]
	pub goals: Option<Value>,
}

/// Relationship record as sent by the graph source.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawRelationship {
	/// Source stakeholder id.
	#[serde(default)]
	pub from: Option<String>,
	/// Target stakeholder id.
	#[serde(default)]
	pub to: Option<String>,
	/// Free-text relationship label.
	#[serde(default)]
	pub label: Option<String>,
}

/// Graph-source payload. Stakeholder order follows the order of the JSON object.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawGraph {
	/// Stakeholder records keyed by id.
	pub stakeholders: IndexMap<String, RawStakeholder>,
	/// Directed relationship records.
	#[serde(default)]
	pub relationships: Vec<RawRelationship>,
}

impl RawGraph {
	/// Decode a graph-source payload. Shape errors are reported as serde errors.
	pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
		serde_json::from_value(value)
	}
}

/// A validated stakeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
	/// Key from the stakeholder map; unique within a graph.
	pub id: String,
	/// Display name, also used in collaborator requests.
	pub name: String,
	/// Job role.
	pub role: String,
	/// Stated goals, in payload order.
	pub goals: Vec<String>,
}

/// A directed, labelled relationship between two stakeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
	/// Id of the originating stakeholder.
	pub source: String,
	/// Id of the receiving stakeholder.
	pub target: String,
	/// Free-text relationship label.
	pub label: String,
}

/// A validated stakeholder graph. Every edge endpoint is a node id and node ids are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
}

fn present(field: &Option<String>) -> Option<&str> {
	field.as_deref().filter(|s| !s.trim().is_empty())
}

fn goal_list(goals: &Option<Value>) -> Option<Vec<String>> {
	match goals {
		Some(Value::Array(items)) => items
			.iter()
			.map(|item| item.as_str().map(str::to_owned))
			.collect(),
		_ => None,
	}
}

impl Graph {
	/// Validate a raw payload into a graph. Nothing is kept if any record fails.
	pub fn from_raw(raw: &RawGraph) -> Result<Self, GraphError> {
		let mut nodes = Vec::with_capacity(raw.stakeholders.len());
		for (id, stakeholder) in &raw.stakeholders {
			let malformed = |reason| GraphError::MalformedStakeholder {
				id: id.clone(),
				reason,
			};
			let name = present(&stakeholder.name).ok_or_else(|| malformed("missing name"))?;
			let role = present(&stakeholder.role).ok_or_else(|| malformed("missing role"))?;
			let goals = goal_list(&stakeholder.goals)
				.ok_or_else(|| malformed("goals is not a list of strings"))?;
			nodes.push(Node {
				id: id.clone(),
				name: name.to_owned(),
				role: role.to_owned(),
				goals,
			});
		}

		let mut edges = Vec::with_capacity(raw.relationships.len());
		for (index, rel) in raw.relationships.iter().enumerate() {
			let required = |value: &Option<String>, field| {
				present(value)
					.map(str::to_owned)
					.ok_or(GraphError::MalformedRelationship { index, field })
			};
			let source = required(&rel.from, "from")?;
			let target = required(&rel.to, "to")?;
			let label = required(&rel.label, "label")?;
			for id in [&source, &target] {
				if !raw.stakeholders.contains_key(id) {
					return Err(GraphError::DanglingReference {
						index,
						id: id.clone(),
					});
				}
			}
			edges.push(Edge {
				source,
				target,
				label,
			});
		}

		Ok(Self { nodes, edges })
	}

	/// Assemble a graph from parts that are already known to be consistent.
	pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		debug_assert!({
			let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
			edges
				.iter()
				.all(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
		});
		Self { nodes, edges }
	}

	/// Nodes in stakeholder-map order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Edges in payload order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Look a node up by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Incident edge count per node id, counting both directions.
	pub fn degrees(&self) -> HashMap<&str, usize> {
		let mut degrees: HashMap<&str, usize> =
			self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
		for edge in &self.edges {
			*degrees.entry(edge.source.as_str()).or_default() += 1;
			*degrees.entry(edge.target.as_str()).or_default() += 1;
		}
		degrees
	}

	/// Display names of every stakeholder except `id`, in graph order.
	pub fn other_names(&self, id: &str) -> Vec<String> {
		self.nodes
			.iter()
			.filter(|n| n.id != id)
			.map(|n| n.name.clone())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn raw(value: Value) -> RawGraph {
		RawGraph::from_value(value).expect("payload should decode")
	}

	#[test]
	fn builds_nodes_in_map_order_and_edges_in_source_order() {
		let graph = Graph::from_raw(&raw(json!({
			"stakeholders": {
				"ceo": {"name": "CEO", "role": "Executive", "goals": ["Grow"]},
				"cfo": {"name": "CFO", "role": "Finance", "goals": []},
				"cto": {"name": "CTO", "role": "Technology", "goals": ["Ship", "Scale"]}
			},
			"relationships": [
				{"from": "cfo", "to": "ceo", "label": "reports to"},
				{"from": "cto", "to": "ceo", "label": "reports to"},
				{"from": "cfo", "to": "cto", "label": "funds"}
			]
		})))
		.unwrap();

		let ids: Vec<_> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["ceo", "cfo", "cto"]);
		assert_eq!(graph.edges()[2].label, "funds");
		assert_eq!(graph.node("cto").unwrap().goals, ["Ship", "Scale"]);

		let ids: HashSet<_> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
		assert!(
			graph
				.edges()
				.iter()
				.all(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
		);
	}

	#[test]
	fn dangling_reference_produces_no_graph() {
		let err = Graph::from_raw(&raw(json!({
			"stakeholders": {"ceo": {"name": "CEO", "role": "Executive", "goals": []}},
			"relationships": [{"from": "x", "to": "ceo", "label": "reports to"}]
		})))
		.unwrap_err();
		assert_eq!(
			err,
			GraphError::DanglingReference {
				index: 0,
				id: "x".into()
			}
		);
	}

	#[test]
	fn rejects_malformed_stakeholders() {
		let missing_role = raw(json!({
			"stakeholders": {"ceo": {"name": "CEO", "goals": []}},
			"relationships": []
		}));
		assert!(matches!(
			Graph::from_raw(&missing_role),
			Err(GraphError::MalformedStakeholder { reason: "missing role", .. })
		));

		let goals_not_list = raw(json!({
			"stakeholders": {"ceo": {"name": "CEO", "role": "Exec", "goals": "grow"}},
			"relationships": []
		}));
		assert!(matches!(
			Graph::from_raw(&goals_not_list),
			Err(GraphError::MalformedStakeholder { .. })
		));

		let blank_name = raw(json!({
			"stakeholders": {"ceo": {"name": "  ", "role": "Exec", "goals": []}},
			"relationships": []
		}));
		assert!(matches!(
			Graph::from_raw(&blank_name),
			Err(GraphError::MalformedStakeholder { reason: "missing name", .. })
		));
	}

	#[test]
	fn rejects_relationship_without_label() {
		let err = Graph::from_raw(&raw(json!({
			"stakeholders": {
				"a": {"name": "A", "role": "r", "goals": []},
				"b": {"name": "B", "role": "r", "goals": []}
			},
			"relationships": [{"from": "a", "to": "b", "label": "ok"}, {"from": "a", "to": "b"}]
		})))
		.unwrap_err();
		assert_eq!(
			err,
			GraphError::MalformedRelationship {
				index: 1,
				field: "label"
			}
		);
	}

	#[test]
	fn stakeholders_must_be_a_map() {
		assert!(RawGraph::from_value(json!({"stakeholders": [1, 2]})).is_err());
	}

	#[test]
	fn degree_counts_both_directions() {
		let graph = Graph::from_raw(&raw(json!({
			"stakeholders": {
				"a": {"name": "A", "role": "r", "goals": []},
				"b": {"name": "B", "role": "r", "goals": []}
			},
			"relationships": [
				{"from": "a", "to": "b", "label": "one"},
				{"from": "b", "to": "a", "label": "two"}
			]
		})))
		.unwrap();
		let degrees = graph.degrees();
		assert_eq!(degrees["a"], 2);
		assert_eq!(degrees["b"], 2);
		assert_eq!(graph.other_names("a"), ["B"]);
	}
}
