//! Stakeholder graph model: validation of graph-source payloads and size reduction.

mod model;
mod reduce;

pub use model::{Edge, Graph, GraphError, Node, RawGraph, RawRelationship, RawStakeholder};
pub use reduce::{MAX_NODES, Reduced, Truncation, reduce};
