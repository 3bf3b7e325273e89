use std::collections::HashSet;

use super::layout::{ForceLayout, LayoutParams};
use super::types::{LayoutFrame, Point};
use crate::graph::Graph;

pub const NODE_RADIUS: f64 = 28.0;
pub const HIT_RADIUS: f64 = 32.0;
/// Pointer travel (screen px) below which a press on a node counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
}

/// Everything the canvas needs between animation frames: the layout, the latest frame and the
/// pointer interaction state.
pub struct ForceGraphState {
	pub layout: ForceLayout,
	pub frame: LayoutFrame,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
}

impl ForceGraphState {
	pub fn new(graph: &Graph, width: f64, height: f64, params: LayoutParams) -> Self {
		let layout = ForceLayout::new(graph, width, height, params);
		let frame = layout.frame();
		Self {
			layout,
			frame,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point {
			x: (sx - self.transform.x) / self.transform.k,
			y: (sy - self.transform.y) / self.transform.k,
		}
	}

	/// Topmost node under a screen position.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let p = self.screen_to_graph(sx, sy);
		self.frame
			.nodes
			.iter()
			.rev()
			.find(|node| {
				let (dx, dy) = (node.position.x - p.x, node.position.y - p.y);
				// HIT_RADIUS is in world-space, scales with zoom like nodes
				(dx * dx + dy * dy).sqrt() < HIT_RADIUS
			})
			.map(|node| node.id.clone())
	}

	pub fn begin_drag(&mut self, id: String, sx: f64, sy: f64) {
		let node_start = self.frame.node(&id).map(|n| n.position).unwrap_or_default();
		self.drag = DragState {
			node: Some(id),
			start_x: sx,
			start_y: sy,
			node_start,
			moved: false,
		};
	}

	/// Follow the pointer with the dragged node. The node is only pinned once the pointer has
	/// travelled far enough for the gesture to be a drag rather than a click.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(id) = self.drag.node.clone() else {
			return;
		};
		let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
		if !self.drag.moved && (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
			return;
		}
		self.drag.moved = true;
		let at = Point {
			x: self.drag.node_start.x + dx / self.transform.k,
			y: self.drag.node_start.y + dy / self.transform.k,
		};
		self.layout.pin(&id, at);
		self.frame = self.layout.frame();
	}

	/// Finish a press on a node. Returns the node id when the gesture was a click.
	pub fn end_drag(&mut self) -> Option<String> {
		let drag = std::mem::take(&mut self.drag);
		let id = drag.node?;
		if drag.moved {
			self.layout.release(&id);
			self.frame = self.layout.frame();
			None
		} else {
			Some(id)
		}
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Zoom around a screen position.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, zoom_in: bool) {
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Abort every gesture, e.g. when the pointer leaves the canvas.
	pub fn cancel_gestures(&mut self) {
		if let Some(id) = self.drag.node.take() {
			if self.drag.moved {
				self.layout.release(&id);
			}
		}
		self.drag = DragState::default();
		self.pan.active = false;
		self.set_hover(None);
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		self.hover.neighbors.clear();
		if let Some(id) = &node {
			for edge in &self.frame.edges {
				if &edge.source == id {
					self.hover.neighbors.insert(edge.target.clone());
				} else if &edge.target == id {
					self.hover.neighbors.insert(edge.source.clone());
				}
			}
		}
		self.hover.node = node;
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.highlight_t > 0.0
	}

	/// Advance the simulation and hover fade, then take a fresh frame.
	pub fn tick(&mut self, dt: f64) {
		self.layout.tick(dt);
		self.frame = self.layout.frame();
		self.flow_time += dt;

		let target = if self.hover.node.is_some() { 1.0 } else { 0.0 };
		self.hover.highlight_t += (target - self.hover.highlight_t) * 1.8 * dt;
		if self.hover.node.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
			self.hover.neighbors.clear();
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.layout.resize(width, height);
		self.frame = self.layout.frame();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::RawGraph;
	use serde_json::json;

	fn state() -> ForceGraphState {
		let raw = RawGraph::from_value(json!({
			"stakeholders": {
				"ceo": {"name": "CEO", "role": "Executive", "goals": []},
				"cfo": {"name": "CFO", "role": "Finance", "goals": []},
				"cto": {"name": "CTO", "role": "Technology", "goals": []}
			},
			"relationships": [
				{"from": "cfo", "to": "ceo", "label": "reports to"},
				{"from": "cto", "to": "ceo", "label": "reports to"}
			]
		}))
		.unwrap();
		ForceGraphState::new(
			&Graph::from_raw(&raw).unwrap(),
			800.0,
			600.0,
			LayoutParams::default(),
		)
	}

	fn screen_pos(state: &ForceGraphState, id: &str) -> (f64, f64) {
		let p = state.frame.node(id).unwrap().position;
		(
			p.x * state.transform.k + state.transform.x,
			p.y * state.transform.k + state.transform.y,
		)
	}

	#[test]
	fn press_without_travel_is_a_click() {
		let mut s = state();
		let (x, y) = screen_pos(&s, "cfo");
		let hit = s.node_at_position(x, y).unwrap();
		assert_eq!(hit, "cfo");
		s.begin_drag(hit, x, y);
		s.drag_to(x + 1.0, y + 1.0);
		assert_eq!(s.end_drag().as_deref(), Some("cfo"));
		assert!(!s.frame.node("cfo").unwrap().pinned);
	}

	#[test]
	fn dragging_pins_then_releases() {
		let mut s = state();
		let (x, y) = screen_pos(&s, "cto");
		s.begin_drag("cto".into(), x, y);
		s.drag_to(x + 50.0, y);
		let node = s.frame.node("cto").unwrap();
		assert!(node.pinned);
		s.tick(0.016);
		let (nx, _) = screen_pos(&s, "cto");
		assert!((nx - (x + 50.0)).abs() < 1e-3);
		assert_eq!(s.end_drag(), None);
		assert!(!s.frame.node("cto").unwrap().pinned);
	}

	#[test]
	fn hover_collects_neighbors() {
		let mut s = state();
		s.set_hover(Some("ceo".into()));
		assert!(s.is_hovered("ceo"));
		assert!(s.is_highlighted("cfo"));
		assert!(s.is_highlighted("cto"));
		s.set_hover(Some("cfo".into()));
		assert!(s.is_highlighted("ceo"));
		assert!(!s.is_highlighted("cto"));
	}

	#[test]
	fn zoom_keeps_the_pointer_fixed() {
		let mut s = state();
		let before = s.screen_to_graph(200.0, 150.0);
		s.zoom_at(200.0, 150.0, true);
		let after = s.screen_to_graph(200.0, 150.0);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);
	}
}
