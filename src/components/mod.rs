//! UI components.

pub mod force_graph;
pub(crate) mod workflow;
