//! Force-directed layout over a validated stakeholder graph.
//!
//! `force_graph` integrates charge repulsion and edge springs. On top of that every tick relaxes
//! edges toward a rest length, nudges the whole layout toward the viewport center, and re-applies
//! pins. A cooling temperature (`alpha`) scales the step and stops the simulation once it decays.

use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;
use serde::Deserialize;

use super::labels::{ParallelSlot, parallel_slots, place_edge};
use super::types::{LayoutFrame, PlacedEdge, PlacedNode, Point};
use crate::graph::Graph;

/// Ticks before the kinetic-energy stop condition is consulted.
const WARMUP_TICKS: u64 = 30;

/// Tuning for [`ForceLayout`]. Every field has a default.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutParams {
	/// Preferred edge length.
	pub rest_length: f64,
	/// Horizontal distance between the two nodes of a two-node graph.
	pub pair_separation: f64,
	/// Arc length reserved per node on the seed circle.
	pub min_spacing: f64,
	/// Seed-radius reduction per incident edge.
	pub degree_pull: f64,
	/// Pairwise repulsion handed to the integrator.
	pub force_charge: f32,
	/// Edge spring stiffness handed to the integrator.
	pub force_spring: f32,
	/// Per-step force clamp.
	pub force_max: f32,
	/// Velocity scale of the integrator.
	pub node_speed: f32,
	/// Velocity kept between integrator steps.
	pub damping_factor: f32,
	/// Mass of every node.
	pub node_mass: f32,
	/// Fraction of the rest-length error corrected per tick at full temperature.
	pub link_strength: f64,
	/// Fraction of the centroid's distance to the viewport center removed per tick.
	pub center_strength: f64,
	/// Per-tick approach of the temperature toward its target.
	pub alpha_decay: f64,
	/// Temperature below which the simulation stops.
	pub alpha_min: f64,
	/// Temperature the simulation is held at while a node is dragged.
	pub drag_alpha_target: f64,
	/// Mean squared per-tick displacement under which the layout counts as settled.
	pub energy_threshold: f64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			rest_length: 220.0,
			pair_separation: 250.0,
			min_spacing: 120.0,
			degree_pull: 20.0,
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			node_mass: 10.0,
			link_strength: 0.3,
			center_strength: 0.1,
			// reaches alpha_min after ~300 ticks
			alpha_decay: 1.0 - 0.001f64.powf(1.0 / 300.0),
			alpha_min: 0.001,
			drag_alpha_target: 0.3,
			energy_threshold: 0.001,
		}
	}
}

/// How a graph is laid out, chosen by its node count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutMode {
	/// Nothing to place.
	Empty,
	/// One node, centered.
	Single,
	/// Two nodes side by side at a fixed separation; never simulated.
	Pair,
	/// Three or more nodes under the force simulation.
	Simulated,
}

/// Arena record for one stakeholder. `force_graph` nodes carry the record's slot as user data.
#[derive(Clone, Debug)]
struct ArenaNode {
	id: String,
	name: String,
	degree: usize,
}

#[derive(Clone, Debug)]
struct Link {
	source: usize,
	target: usize,
	label: String,
	slot: ParallelSlot,
}

/// Continuously relaxed positions for one graph in a `width` by `height` viewport.
///
/// The layout is the only writer of node coordinates. Callers read them through [`frame`]
/// after each [`tick`].
///
/// [`frame`]: ForceLayout::frame
/// [`tick`]: ForceLayout::tick
pub struct ForceLayout {
	sim: ForceGraph<usize, ()>,
	nodes: Vec<ArenaNode>,
	links: Vec<Link>,
	pins: Vec<Option<Point>>,
	params: LayoutParams,
	mode: LayoutMode,
	width: f64,
	height: f64,
	alpha: f64,
	alpha_target: f64,
	energy: f64,
	running: bool,
	ticks: u64,
}

impl ForceLayout {
	/// Seed positions for `graph` and start simulating if it has three or more nodes.
	pub fn new(graph: &Graph, width: f64, height: f64, params: LayoutParams) -> Self {
		let mode = match graph.len() {
			0 => LayoutMode::Empty,
			1 => LayoutMode::Single,
			2 => LayoutMode::Pair,
			_ => LayoutMode::Simulated,
		};
		let mut sim = ForceGraph::new(SimulationParameters {
			force_charge: params.force_charge,
			force_spring: params.force_spring,
			force_max: params.force_max,
			node_speed: params.node_speed,
			damping_factor: params.damping_factor,
		});

		let degrees = graph.degrees();
		let nodes: Vec<ArenaNode> = graph
			.nodes()
			.iter()
			.map(|n| ArenaNode {
				id: n.id.clone(),
				name: n.name.clone(),
				degree: degrees.get(n.id.as_str()).copied().unwrap_or(0),
			})
			.collect();

		let mut handles = Vec::with_capacity(nodes.len());
		for (slot, seed) in seed_positions(&nodes, mode, width, height, &params)
			.into_iter()
			.enumerate()
		{
			handles.push(sim.add_node(NodeData {
				x: seed.x as f32,
				y: seed.y as f32,
				mass: params.node_mass,
				is_anchor: false,
				user_data: slot,
			}));
		}

		let slot_of = |id: &str| nodes.iter().position(|n| n.id == id);
		let slots = parallel_slots(
			graph
				.edges()
				.iter()
				.map(|e| (e.source.as_str(), e.target.as_str())),
		);
		let mut links = Vec::with_capacity(graph.edges().len());
		for (edge, slot) in graph.edges().iter().zip(slots) {
			let (Some(source), Some(target)) = (slot_of(&edge.source), slot_of(&edge.target))
			else {
				continue;
			};
			// self-loops have no direction to pull along
			if source != target {
				sim.add_edge(handles[source], handles[target], EdgeData::default());
			}
			links.push(Link {
				source,
				target,
				label: edge.label.clone(),
				slot,
			});
		}

		debug!(
			"layout: {} nodes, {} edges, mode {:?}",
			nodes.len(),
			links.len(),
			mode
		);

		Self {
			sim,
			pins: vec![None; nodes.len()],
			nodes,
			links,
			params,
			mode,
			width,
			height,
			alpha: 1.0,
			alpha_target: 0.0,
			energy: f64::INFINITY,
			running: mode == LayoutMode::Simulated,
			ticks: 0,
		}
	}

	/// Placement strategy in use.
	pub fn mode(&self) -> LayoutMode {
		self.mode
	}

	/// Whether further ticks can move nodes.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Current temperature.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Mean squared displacement of free nodes during the last tick.
	pub fn energy(&self) -> f64 {
		self.energy
	}

	/// Viewport center.
	pub fn center(&self) -> Point {
		Point {
			x: self.width / 2.0,
			y: self.height / 2.0,
		}
	}

	/// Halt the simulation; positions stay where they are.
	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Advance the simulation by `dt` seconds. Returns whether positions changed.
	pub fn tick(&mut self, dt: f64) -> bool {
		if !self.running {
			return false;
		}
		if self.mode != LayoutMode::Simulated {
			self.running = false;
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let before = self.positions();

		self.sim.update((dt * self.alpha) as f32);
		self.relax_links();
		self.pull_to_center();
		self.apply_pins();
		self.sanitize();

		let after = self.positions();
		let free = self.pins.iter().filter(|p| p.is_none()).count().max(1);
		self.energy = before
			.iter()
			.zip(&after)
			.zip(&self.pins)
			.filter(|(_, pin)| pin.is_none())
			.map(|((a, b), _)| (b.x - a.x).powi(2) + (b.y - a.y).powi(2))
			.sum::<f64>()
			/ free as f64;
		self.ticks += 1;

		let dragging = self.pins.iter().any(Option::is_some);
		let settled =
			!dragging && self.ticks > WARMUP_TICKS && self.energy < self.params.energy_threshold;
		if self.alpha < self.params.alpha_min || settled {
			self.running = false;
			debug!(
				"layout settled after {} ticks (alpha {:.4}, energy {:.5})",
				self.ticks, self.alpha, self.energy
			);
		}
		true
	}

	/// Pin a node at `at`. The first pin of a gesture heats the simulation.
	pub fn pin(&mut self, id: &str, at: Point) -> bool {
		let Some(slot) = self.slot(id) else {
			return false;
		};
		if self.pins.iter().all(Option::is_none) {
			self.alpha_target = self.params.drag_alpha_target;
			self.running = self.mode == LayoutMode::Simulated;
		}
		self.pins[slot] = Some(at);
		self.apply_pins();
		true
	}

	/// Release a pinned node and let the simulation cool again.
	pub fn release(&mut self, id: &str) {
		let Some(slot) = self.slot(id) else {
			return;
		};
		if self.pins[slot].take().is_none() {
			return;
		}
		self.sim.visit_nodes_mut(|node| {
			if node.data.user_data == slot {
				node.data.is_anchor = false;
			}
		});
		if self.pins.iter().all(Option::is_none) {
			self.alpha_target = 0.0;
		}
		if matches!(self.mode, LayoutMode::Pair | LayoutMode::Single) {
			self.reseed();
		}
	}

	/// Adopt a new viewport. Fixed layouts are re-placed, simulated ones warmed up to drift over.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		match self.mode {
			LayoutMode::Simulated => {
				self.alpha = self.alpha.max(self.params.drag_alpha_target);
				self.running = true;
			}
			LayoutMode::Pair | LayoutMode::Single => self.reseed(),
			LayoutMode::Empty => {}
		}
	}

	/// Current position of one node.
	pub fn position(&self, id: &str) -> Option<Point> {
		let slot = self.slot(id)?;
		self.positions().get(slot).copied()
	}

	/// Fresh snapshot of every node and edge, label geometry included.
	pub fn frame(&self) -> LayoutFrame {
		let positions = self.positions();
		let nodes = self
			.nodes
			.iter()
			.zip(&positions)
			.zip(&self.pins)
			.map(|((node, &position), pin)| PlacedNode {
				id: node.id.clone(),
				name: node.name.clone(),
				degree: node.degree,
				position,
				pinned: pin.is_some(),
			})
			.collect();
		let edges = self
			.links
			.iter()
			.map(|link| PlacedEdge {
				source: self.nodes[link.source].id.clone(),
				target: self.nodes[link.target].id.clone(),
				label: link.label.clone(),
				geometry: place_edge(positions[link.source], positions[link.target], link.slot),
			})
			.collect();
		LayoutFrame { nodes, edges }
	}

	fn slot(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|n| n.id == id)
	}

	fn positions(&self) -> Vec<Point> {
		let mut out = vec![Point::default(); self.nodes.len()];
		self.sim.visit_nodes(|node| {
			if let Some(p) = out.get_mut(node.data.user_data) {
				*p = Point {
					x: node.x() as f64,
					y: node.y() as f64,
				};
			}
		});
		out
	}

	fn shift_free_nodes(&mut self, shifts: &[Point]) {
		let pins = &self.pins;
		self.sim.visit_nodes_mut(|node| {
			let slot = node.data.user_data;
			if pins.get(slot).is_some_and(Option::is_none) {
				node.data.x += shifts[slot].x as f32;
				node.data.y += shifts[slot].y as f32;
			}
		});
	}

	fn relax_links(&mut self) {
		let positions = self.positions();
		let mut shifts = vec![Point::default(); positions.len()];
		for link in &self.links {
			if link.source == link.target {
				continue;
			}
			let (a, b) = (positions[link.source], positions[link.target]);
			let (dx, dy) = (b.x - a.x, b.y - a.y);
			let distance = (dx * dx + dy * dy).sqrt();
			if distance < f64::EPSILON {
				continue;
			}
			let k = (distance - self.params.rest_length) / distance
				* self.params.link_strength
				* self.alpha
				* 0.5;
			shifts[link.source].x += dx * k;
			shifts[link.source].y += dy * k;
			shifts[link.target].x -= dx * k;
			shifts[link.target].y -= dy * k;
		}
		self.shift_free_nodes(&shifts);
	}

	fn pull_to_center(&mut self) {
		let positions = self.positions();
		if positions.is_empty() {
			return;
		}
		let n = positions.len() as f64;
		let centroid = Point {
			x: positions.iter().map(|p| p.x).sum::<f64>() / n,
			y: positions.iter().map(|p| p.y).sum::<f64>() / n,
		};
		let center = self.center();
		let shift = Point {
			x: (center.x - centroid.x) * self.params.center_strength,
			y: (center.y - centroid.y) * self.params.center_strength,
		};
		self.shift_free_nodes(&vec![shift; positions.len()]);
	}

	fn apply_pins(&mut self) {
		let pins = &self.pins;
		self.sim.visit_nodes_mut(|node| {
			if let Some(Some(at)) = pins.get(node.data.user_data) {
				node.data.x = at.x as f32;
				node.data.y = at.y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	/// Put any node the integrator blew up back near the center.
	fn sanitize(&mut self) {
		let center = self.center();
		self.sim.visit_nodes_mut(|node| {
			if !node.data.x.is_finite() || !node.data.y.is_finite() {
				let angle = node.data.user_data as f64;
				node.data.x = (center.x + angle.cos()) as f32;
				node.data.y = (center.y + angle.sin()) as f32;
			}
		});
	}

	/// Restore the fixed placement of single-node and two-node layouts.
	fn reseed(&mut self) {
		let seeds = seed_positions(&self.nodes, self.mode, self.width, self.height, &self.params);
		let pins = &self.pins;
		self.sim.visit_nodes_mut(|node| {
			let slot = node.data.user_data;
			if pins.get(slot).is_some_and(Option::is_none) {
				node.data.x = seeds[slot].x as f32;
				node.data.y = seeds[slot].y as f32;
			}
		});
	}
}

/// Starting coordinates: fixed for one or two nodes, otherwise a circle where better connected
/// nodes sit closer to the center.
fn seed_positions(
	nodes: &[ArenaNode],
	mode: LayoutMode,
	width: f64,
	height: f64,
	params: &LayoutParams,
) -> Vec<Point> {
	let center = Point {
		x: width / 2.0,
		y: height / 2.0,
	};
	match mode {
		LayoutMode::Empty => Vec::new(),
		LayoutMode::Single => vec![center],
		LayoutMode::Pair => {
			let half = params.pair_separation / 2.0;
			vec![
				Point {
					x: center.x - half,
					y: center.y,
				},
				Point {
					x: center.x + half,
					y: center.y,
				},
			]
		}
		LayoutMode::Simulated => {
			let n = nodes.len() as f64;
			let radius = (width.min(height) / 3.0).max(n * params.min_spacing / (2.0 * PI));
			nodes
				.iter()
				.enumerate()
				.map(|(i, node)| {
					let angle = i as f64 * 2.0 * PI / n;
					let r = (radius - node.degree as f64 * params.degree_pull).max(radius * 0.25);
					Point {
						x: center.x + r * angle.cos(),
						y: center.y + r * angle.sin(),
					}
				})
				.collect()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::RawGraph;
	use serde_json::{Map, Value, json};

	fn graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
		let mut stakeholders = Map::new();
		for id in ids {
			stakeholders.insert(
				id.to_string(),
				json!({"name": id.to_uppercase(), "role": "role", "goals": []}),
			);
		}
		let relationships: Vec<_> = edges
			.iter()
			.map(|(a, b)| json!({"from": a, "to": b, "label": "talks to"}))
			.collect();
		let raw = RawGraph::from_value(json!({
			"stakeholders": Value::Object(stakeholders),
			"relationships": relationships,
		}))
		.unwrap();
		Graph::from_raw(&raw).unwrap()
	}

	fn star() -> Graph {
		graph(&["a", "b", "c", "d", "e"], &[
			("a", "b"),
			("a", "c"),
			("a", "d"),
			("a", "e"),
			("b", "c"),
		])
	}

	fn distance(a: Point, b: Point) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn empty_graph_is_a_no_op() {
		let mut layout = ForceLayout::new(&Graph::default(), 800.0, 600.0, LayoutParams::default());
		assert_eq!(layout.mode(), LayoutMode::Empty);
		assert!(!layout.tick(0.016));
		assert!(layout.frame().nodes.is_empty());
	}

	#[test]
	fn single_node_is_centered() {
		let mut layout = ForceLayout::new(&graph(&["a"], &[]), 800.0, 600.0, LayoutParams::default());
		for _ in 0..10 {
			layout.tick(0.016);
		}
		assert_eq!(layout.position("a"), Some(Point { x: 400.0, y: 300.0 }));
	}

	#[test]
	fn two_nodes_sit_at_fixed_separation() {
		for edges in [vec![], vec![("a", "b")]] {
			let mut layout =
				ForceLayout::new(&graph(&["a", "b"], &edges), 800.0, 600.0, LayoutParams::default());
			for _ in 0..50 {
				layout.tick(0.016);
			}
			assert_eq!(layout.position("a"), Some(Point { x: 275.0, y: 300.0 }));
			assert_eq!(layout.position("b"), Some(Point { x: 525.0, y: 300.0 }));
			assert!(!layout.is_running());
		}
	}

	#[test]
	fn pair_snaps_back_after_drag() {
		let mut layout =
			ForceLayout::new(&graph(&["a", "b"], &[("a", "b")]), 800.0, 600.0, LayoutParams::default());
		layout.pin("a", Point { x: 10.0, y: 10.0 });
		assert_eq!(layout.position("a"), Some(Point { x: 10.0, y: 10.0 }));
		layout.release("a");
		assert_eq!(layout.position("a"), Some(Point { x: 275.0, y: 300.0 }));
	}

	#[test]
	fn better_connected_nodes_start_closer_to_center() {
		let layout = ForceLayout::new(&star(), 800.0, 600.0, LayoutParams::default());
		let center = layout.center();
		let frame = layout.frame();
		let hub = distance(frame.node("a").unwrap().position, center);
		let leaf = distance(frame.node("d").unwrap().position, center);
		assert!(hub < leaf);
	}

	#[test]
	fn pinned_node_follows_the_pointer() {
		let mut layout = ForceLayout::new(&star(), 800.0, 600.0, LayoutParams::default());
		let target = Point { x: 120.0, y: 80.0 };
		assert!(layout.pin("a", target));
		for _ in 0..60 {
			layout.tick(0.016);
		}
		assert_eq!(layout.position("a"), Some(target));
		assert!(layout.frame().node("a").unwrap().pinned);
	}

	#[test]
	fn drag_keeps_the_simulation_warm_until_release() {
		let mut layout = ForceLayout::new(&star(), 800.0, 600.0, LayoutParams::default());
		layout.pin("b", Point { x: 100.0, y: 100.0 });
		for _ in 0..600 {
			layout.tick(0.016);
		}
		assert!(layout.is_running());
		assert!(layout.alpha() > 0.25);

		layout.release("b");
		let mut ticks = 0;
		while layout.tick(0.016) {
			ticks += 1;
			assert!(ticks < 2000, "simulation never cooled down");
		}
		assert!(!layout.is_running());
		assert!(!layout.frame().node("b").unwrap().pinned);
	}

	#[test]
	fn simulation_cools_down_and_stays_finite() {
		let ids: Vec<String> = (0..20).map(|i| format!("n{i}")).collect();
		let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
		let edges: Vec<(&str, &str)> = (1..20).map(|i| (id_refs[0], id_refs[i])).collect();
		let mut layout =
			ForceLayout::new(&graph(&id_refs, &edges), 1024.0, 768.0, LayoutParams::default());

		let mut ticks = 0;
		while layout.tick(0.016) {
			ticks += 1;
			assert!(ticks < 2000, "simulation never cooled down");
		}
		let frame = layout.frame();
		assert!(
			frame
				.nodes
				.iter()
				.all(|n| n.position.x.is_finite() && n.position.y.is_finite())
		);
		assert_eq!(frame.edges.len(), 19);
	}

	#[test]
	fn resize_recenters_the_layout() {
		let mut layout = ForceLayout::new(&star(), 800.0, 600.0, LayoutParams::default());
		layout.resize(1000.0, 800.0);
		assert!(layout.is_running());
		for _ in 0..200 {
			layout.tick(0.016);
		}
		let frame = layout.frame();
		let n = frame.nodes.len() as f64;
		let centroid = Point {
			x: frame.nodes.iter().map(|p| p.position.x).sum::<f64>() / n,
			y: frame.nodes.iter().map(|p| p.position.y).sum::<f64>() / n,
		};
		assert!(distance(centroid, Point { x: 500.0, y: 400.0 }) < 5.0);
	}

	#[test]
	fn frame_labels_track_live_positions() {
		let mut layout = ForceLayout::new(&star(), 800.0, 600.0, LayoutParams::default());
		layout.pin("a", Point { x: 0.0, y: 0.0 });
		let frame = layout.frame();
		let edge = frame.edges.iter().find(|e| e.source == "a").unwrap();
		assert_eq!(edge.geometry.start, Point { x: 0.0, y: 0.0 });
	}
}
