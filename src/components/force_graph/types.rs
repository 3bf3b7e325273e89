//! Layout output types.

use super::labels::EdgeGeometry;

/// A position in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downward.
	pub y: f64,
}

/// A stakeholder at its current position.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedNode {
	/// Stakeholder id.
	pub id: String,
	/// Display name drawn on the node.
	pub name: String,
	/// Incident edge count.
	pub degree: usize,
	/// Current position.
	pub position: Point,
	/// Held under the pointer.
	pub pinned: bool,
}

/// A relationship with its geometry for the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedEdge {
	/// Source stakeholder id.
	pub source: String,
	/// Target stakeholder id.
	pub target: String,
	/// Relationship label.
	pub label: String,
	/// Curve and label anchor.
	pub geometry: EdgeGeometry,
}

/// Immutable snapshot of the layout after one tick. Rebuilt every tick, never cached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutFrame {
	/// Nodes in graph order.
	pub nodes: Vec<PlacedNode>,
	/// Edges in graph order.
	pub edges: Vec<PlacedEdge>,
}

impl LayoutFrame {
	/// Look a placed node up by id.
	pub fn node(&self, id: &str) -> Option<&PlacedNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}
