//! Canvas graph view: force layout, edge geometry and the Leptos component drawing them.

mod component;
pub mod labels;
mod layout;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use layout::{ForceLayout, LayoutMode, LayoutParams};
pub use types::{LayoutFrame, PlacedEdge, PlacedNode, Point};
