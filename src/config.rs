//! Runtime settings for the explorer.
//!
//! A browser bundle has no process environment, so overrides are baked in at build time through
//! `option_env!` and everything else falls back to [`Default`].

use serde::Deserialize;

use crate::components::force_graph::LayoutParams;
use crate::graph::MAX_NODES;

/// Collaborator endpoints.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
	/// Industry to stakeholder graph.
	pub graph: String,
	/// Stakeholder to workflow steps.
	pub workflow: String,
	/// Workflow step to pain-point analysis.
	pub pain_points: String,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self {
			graph: "/api/stakeholders".into(),
			workflow: "/api/workflow".into(),
			pain_points: "/api/analyze-step".into(),
		}
	}
}

/// Top-level settings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
	/// Where the collaborators live.
	pub endpoints: Endpoints,
	/// Override for [`MAX_NODES`]; zero is treated as unset.
	pub max_nodes: Option<usize>,
	/// Force layout tuning.
	pub layout: LayoutParams,
}

impl ExplorerConfig {
	/// Defaults with build-time overrides applied.
	pub fn from_env() -> Self {
		let mut config = Self::default();
		if let Some(url) = option_env!("EXPLORER_GRAPH_URL") {
			config.endpoints.graph = url.into();
		}
		if let Some(url) = option_env!("EXPLORER_WORKFLOW_URL") {
			config.endpoints.workflow = url.into();
		}
		if let Some(url) = option_env!("EXPLORER_PAIN_POINTS_URL") {
			config.endpoints.pain_points = url.into();
		}
		config.max_nodes = option_env!("EXPLORER_MAX_NODES").and_then(|n| n.parse().ok());
		config
	}

	/// Upper bound on rendered stakeholders.
	pub fn max_nodes(&self) -> usize {
		self.max_nodes.filter(|&n| n > 0).unwrap_or(MAX_NODES)
	}
}
