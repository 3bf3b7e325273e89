//! Contracts with the two external collaborators and the tagged schemas of their payloads.
//!
//! Sources hand back raw JSON; every payload is validated here, at the boundary, before any of
//! it reaches the explorer's stores.

use std::cmp::Reverse;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// Produces raw stakeholder/relationship data for an industry query.
#[async_trait(?Send)]
pub trait GraphSource {
	/// Raw graph payload for `industry`, validated by the caller.
	async fn stakeholders(&self, industry: &str) -> Result<Value, FetchError>;
}

/// Produces workflow steps for a stakeholder and pain-point evidence for a step.
#[async_trait(?Send)]
pub trait DetailSource {
	/// Raw `{ workflow: [...] }` payload for one stakeholder.
	async fn workflow(&self, request: &WorkflowRequest) -> Result<Value, FetchError>;

	/// Raw `{ success, data?, error? }` envelope for one step.
	async fn pain_points(&self, request: &PainPointRequest) -> Result<Value, FetchError>;
}

/// Body of a workflow request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
	/// Trimmed industry query.
	pub industry: String,
	/// Name of the stakeholder whose workflow is wanted.
	pub stakeholder: String,
	/// Names of every other stakeholder in the graph.
	pub other_stakeholders: Vec<String>,
}

/// Body of a pain-point request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PainPointRequest {
	/// Trimmed industry query.
	pub industry: String,
	/// Stakeholder name.
	pub stakeholder: String,
	/// Step title.
	pub step: String,
	/// Step description.
	pub description: String,
}

/// One workflow step as sent by the detail source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawWorkflowStep {
	/// Step name.
	pub title: String,
	/// What happens during the step.
	pub description: String,
	/// Sent as `estimatedTime`.
	pub estimated_time: String,
	/// Sent as `keyOutputs`.
	pub key_outputs: Vec<String>,
	/// Decisions taken during the step.
	pub decisions: Vec<String>,
}

/// Extract the steps of a workflow payload. `workflow` must be an array.
pub fn parse_workflow(payload: Value) -> Result<Vec<RawWorkflowStep>, FetchError> {
	let Value::Object(mut body) = payload else {
		return Err(FetchError::Format("workflow payload is not an object".into()));
	};
	match body.remove("workflow") {
		Some(steps @ Value::Array(_)) => Ok(serde_json::from_value(steps)?),
		_ => Err(FetchError::Format("`workflow` is not an array".into())),
	}
}

/// A public mention backing a pain point.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMention {
	/// Platform tag, see [`Platform`](super::Platform).
	#[serde(default)]
	pub platform: String,
	/// Headline or post title.
	#[serde(default)]
	pub title: String,
	/// Link to the mention.
	#[serde(default)]
	pub url: String,
	/// ISO-8601 date.
	#[serde(default)]
	pub date: String,
	/// Verbatim quote backing the pain point.
	#[serde(default)]
	pub evidence: String,
}

/// One pain point with its supporting mentions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainPoint {
	/// The pain point itself; also its expansion key in the panel.
	pub point: String,
	/// Evidence, possibly empty.
	#[serde(default)]
	pub sources: Vec<SourceMention>,
}

/// Pain-point analysis of one workflow step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainPointAnalysis {
	/// Pain points in the order the source returned them.
	#[serde(default)]
	pub pain_points: Vec<PainPoint>,
}

impl PainPointAnalysis {
	/// Pain points with the most source mentions first. Ties keep their original order.
	pub fn ranked(&self) -> Vec<PainPoint> {
		let mut ranked = self.pain_points.clone();
		ranked.sort_by_key(|p| Reverse(p.sources.len()));
		ranked
	}
}

#[derive(Debug, Deserialize)]
struct PainPointEnvelope {
	success: bool,
	#[serde(default)]
	data: Option<PainPointAnalysis>,
	#[serde(default)]
	error: Option<String>,
}

/// Unwrap a `{ success, data?, error? }` pain-point envelope.
pub fn parse_pain_points(payload: Value) -> Result<PainPointAnalysis, FetchError> {
	let envelope: PainPointEnvelope = serde_json::from_value(payload)?;
	match envelope {
		PainPointEnvelope {
			success: true,
			data: Some(data),
			..
		} => Ok(data),
		PainPointEnvelope { success: true, .. } => {
			Err(FetchError::Format("successful analysis without `data`".into()))
		}
		PainPointEnvelope { error, .. } => Err(FetchError::Transport(
			error.unwrap_or_else(|| "Failed to analyze step details".into()),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn workflow_request_uses_camel_case() {
		let request = WorkflowRequest {
			industry: "healthcare".into(),
			stakeholder: "CFO".into(),
			other_stakeholders: vec!["CEO".into()],
		};
		assert_eq!(
			serde_json::to_value(&request).unwrap(),
			json!({"industry": "healthcare", "stakeholder": "CFO", "otherStakeholders": ["CEO"]})
		);
	}

	#[test]
	fn parses_workflow_steps() {
		let steps = parse_workflow(json!({
			"workflow": [{
				"title": "Approve Budget",
				"description": "Sign off on spend",
				"estimatedTime": "2 days",
				"keyOutputs": ["Budget"],
				"decisions": ["Go / no-go"]
			}]
		}))
		.unwrap();
		assert_eq!(steps.len(), 1);
		assert_eq!(steps[0].estimated_time, "2 days");
		assert_eq!(steps[0].key_outputs, ["Budget"]);
	}

	#[test]
	fn workflow_must_be_an_array() {
		for payload in [json!({"workflow": {"title": "x"}}), json!({}), json!([1, 2])] {
			assert!(matches!(parse_workflow(payload), Err(FetchError::Format(_))));
		}
	}

	#[test]
	fn unwraps_pain_point_envelope() {
		let analysis = parse_pain_points(json!({
			"success": true,
			"data": {"painPoints": [{
				"point": "Manual reconciliation",
				"sources": [{
					"platform": "linkedin",
					"title": "Finance ops thread",
					"url": "https://example.test/post",
					"date": "2024-03-05",
					"evidence": "We still reconcile by hand."
				}]
			}]}
		}))
		.unwrap();
		assert_eq!(analysis.pain_points[0].sources[0].platform, "linkedin");
	}

	#[test]
	fn failed_envelope_carries_its_message() {
		let err = parse_pain_points(json!({"success": false, "error": "webhook down"})).unwrap_err();
		assert_eq!(err, FetchError::Transport("webhook down".into()));
	}

	#[test]
	fn best_evidenced_pain_points_rank_first() {
		let analysis = parse_pain_points(json!({
			"success": true,
			"data": {"painPoints": [
				{"point": "Slow approvals", "sources": [{"platform": "news"}]},
				{"point": "Manual reconciliation", "sources": [{"platform": "x"}, {"platform": "news"}]},
				{"point": "Unclear ownership"},
				{"point": "Audit prep", "sources": [{"platform": "linkedin"}]}
			]}
		}))
		.unwrap();
		let order: Vec<_> = analysis.ranked().into_iter().map(|p| p.point).collect();
		assert_eq!(
			order,
			["Manual reconciliation", "Slow approvals", "Audit prep", "Unclear ownership"]
		);
		assert_eq!(analysis.pain_points[0].point, "Slow approvals");
	}
}
