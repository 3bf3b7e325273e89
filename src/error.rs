//! Error taxonomy for the explorer.
//!
//! Validation failures abort an analysis attempt; fetch and format failures are recoverable and
//! only ever surface as a dismissible message. Every variant is `Clone` so a single in-flight
//! request can hand the same outcome to all of its waiters.

use crate::graph::GraphError;

/// A collaborator call that did not produce a usable payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
	/// The transport failed or the collaborator answered with a non-success status.
	#[error("request failed: {0}")]
	Transport(String),

	/// The payload arrived but does not have the expected shape.
	#[error("unexpected response shape: {0}")]
	Format(String),
}

impl From<serde_json::Error> for FetchError {
	fn from(err: serde_json::Error) -> Self {
		Self::Format(err.to_string())
	}
}

/// Every failure the explorer can surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplorerError {
	/// The industry query was blank.
	#[error("industry query is empty")]
	EmptyIndustry,

	/// The graph source returned data that does not form a valid graph.
	#[error("invalid stakeholder graph: {0}")]
	Validation(#[from] GraphError),

	/// The graph source could not be reached or answered with garbage.
	#[error("stakeholder analysis failed: {0}")]
	GraphFetch(FetchError),

	/// Workflow steps for a stakeholder could not be fetched.
	#[error("workflow fetch for `{stakeholder}` failed: {source}")]
	WorkflowFetch {
		/// Display name of the stakeholder whose steps were requested.
		stakeholder: String,
		/// Underlying failure.
		source: FetchError,
	},

	/// Pain-point evidence for a workflow step could not be fetched.
	#[error("pain-point analysis for `{step}` failed: {source}")]
	PainPointFetch {
		/// Title of the workflow step.
		step: String,
		/// Underlying failure.
		source: FetchError,
	},
}

impl ExplorerError {
	/// Text for the dismissible error banner.
	pub fn user_message(&self) -> String {
		match self {
			Self::EmptyIndustry => "Please enter an industry or use-case".into(),
			Self::Validation(_) | Self::GraphFetch(_) => "Failed to analyze. Please try again.".into(),
			Self::WorkflowFetch { .. } => {
				"Failed to fetch stakeholder workflow. Please try again.".into()
			}
			Self::PainPointFetch { .. } => "Failed to analyze step details".into(),
		}
	}

	/// Whether retrying the same action could succeed.
	pub fn is_recoverable(&self) -> bool {
		!matches!(self, Self::Validation(_) | Self::EmptyIndustry)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn format_errors_read_like_fetch_errors() {
		let transport = ExplorerError::WorkflowFetch {
			stakeholder: "CFO".into(),
			source: FetchError::Transport("status 502".into()),
		};
		let format = ExplorerError::WorkflowFetch {
			stakeholder: "CFO".into(),
			source: FetchError::Format("`workflow` is not an array".into()),
		};
		assert_eq!(transport.user_message(), format.user_message());
		assert!(transport.is_recoverable());
		assert!(format.is_recoverable());
	}

	#[test]
	fn validation_is_not_recoverable() {
		let err = ExplorerError::from(GraphError::DanglingReference {
			index: 0,
			id: "x".into(),
		});
		assert!(!err.is_recoverable());
		assert_eq!(err.user_message(), "Failed to analyze. Please try again.");
	}
}
