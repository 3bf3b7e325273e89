//! Curved edge paths and label anchors for parallel edges.
//!
//! Everything here is a pure function of the live endpoint positions and the edge's slot among
//! its parallel siblings, so it is recomputed from scratch on every tick.

use super::types::Point;

/// Control-point offset as a fraction of edge length.
pub const CURVE_FACTOR: f64 = 0.2;
/// Extra spread applied proportionally to a label's offset.
pub const CROWDING_BOOST: f64 = 0.3;

const MIN_BASE_OFFSET: f64 = 40.0;
const MAX_BASE_OFFSET: f64 = 60.0;
const OFFSET_PER_EDGE: f64 = 5.0;

/// Position of an edge among all edges joining the same pair of nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelSlot {
	/// Zero-based position within the group.
	pub index: usize,
	/// Size of the group.
	pub total: usize,
	/// Edge runs against the pair's canonical direction, so its normal points the other way.
	pub reversed: bool,
}

impl ParallelSlot {
	/// The only edge between its two nodes.
	pub const SINGLE: Self = Self {
		index: 0,
		total: 1,
		reversed: false,
	};
}

/// Quadratic curve of one edge plus where its label goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeGeometry {
	/// Source node position.
	pub start: Point,
	/// Quadratic control point.
	pub control: Point,
	/// Target node position.
	pub end: Point,
	/// Label anchor.
	pub label: Point,
	/// Signed perpendicular distance of the label from the unshifted curve midpoint.
	pub label_offset: f64,
}

/// Perpendicular label offset for slot `index` of `total` parallel edges.
pub fn parallel_offset(index: usize, total: usize) -> f64 {
	if total <= 1 {
		return 0.0;
	}
	let base = (MIN_BASE_OFFSET + total as f64 * OFFSET_PER_EDGE).min(MAX_BASE_OFFSET);
	let offset = (index as f64 - (total as f64 - 1.0) / 2.0) * base;
	offset + offset.signum() * offset.abs() * CROWDING_BOOST
}

/// Unit normal of the segment `start -> end`; straight up when the points coincide.
fn unit_normal(start: Point, end: Point) -> Point {
	let (dx, dy) = (end.x - start.x, end.y - start.y);
	let length = (dx * dx + dy * dy).sqrt();
	if length < f64::EPSILON {
		return Point { x: 0.0, y: -1.0 };
	}
	Point {
		x: -dy / length,
		y: dx / length,
	}
}

/// Quadratic curve and label anchor for one edge.
pub fn place_edge(start: Point, end: Point, slot: ParallelSlot) -> EdgeGeometry {
	let (dx, dy) = (end.x - start.x, end.y - start.y);
	let length = (dx * dx + dy * dy).sqrt();
	let normal = unit_normal(start, end);
	let mid = Point {
		x: (start.x + end.x) / 2.0,
		y: (start.y + end.y) / 2.0,
	};

	let mut label_offset = parallel_offset(slot.index, slot.total);
	if slot.reversed {
		label_offset = -label_offset;
	}

	// Parallel siblings bend apart so their curves stay distinguishable.
	let bend = CURVE_FACTOR * length + label_offset;
	let control = Point {
		x: mid.x + normal.x * bend,
		y: mid.y + normal.y * bend,
	};

	// B(0.5) of the unshifted curve, then pushed out by the slot offset.
	let base = CURVE_FACTOR * length / 2.0 + label_offset;
	let label = Point {
		x: mid.x + normal.x * base,
		y: mid.y + normal.y * base,
	};

	EdgeGeometry {
		start,
		control,
		end,
		label,
		label_offset,
	}
}

/// Assign parallel slots to a list of `(source, target)` endpoint pairs.
///
/// Edges joining the same two nodes, in either direction, share a group. Indices follow input
/// order. The canonical direction of a group is that of its first edge.
pub fn parallel_slots<'a, I>(pairs: I) -> Vec<ParallelSlot>
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let pairs: Vec<_> = pairs.into_iter().collect();
	let mut groups: Vec<((&str, &str), usize)> = Vec::new();
	let mut slots = Vec::with_capacity(pairs.len());

	for &(source, target) in &pairs {
		let found = groups.iter_mut().find(|((a, b), _)| {
			(*a == source && *b == target) || (*a == target && *b == source)
		});
		let (canonical, index) = match found {
			Some((canonical, count)) => {
				*count += 1;
				(*canonical, *count - 1)
			}
			None => {
				groups.push(((source, target), 1));
				((source, target), 0)
			}
		};
		slots.push(ParallelSlot {
			index,
			total: 0,
			reversed: canonical.0 != source,
		});
	}

	for (slot, &(source, target)) in slots.iter_mut().zip(&pairs) {
		slot.total = groups
			.iter()
			.find(|((a, b), _)| {
				(*a == source && *b == target) || (*a == target && *b == source)
			})
			.map_or(1, |(_, count)| *count);
	}
	slots
}
