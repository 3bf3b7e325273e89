//! Navigation state: which stakeholder, workflow section, step and pain points the user is
//! looking at.
//!
//! Every transition here is synchronous. Fetches are described by a [`WorkflowTicket`] that the
//! async driver carries to the detail source and hands back with the result. The ticket doubles
//! as the loading gate: while one is outstanding, selection input is ignored.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info, warn};

use super::cache::CacheKey;
use super::source::{PainPointRequest, RawWorkflowStep, WorkflowRequest};
use crate::error::{ExplorerError, FetchError};
use crate::graph::Graph;

/// Position of a step inside its stakeholder's workflow.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StepRef {
	/// Section the step belongs to.
	pub stakeholder_id: String,
	/// Position in the section's steps.
	pub index: usize,
}

/// A validated workflow step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowStep {
	/// `<stakeholder name>-step-<index>`; positional, so reordering a response changes it.
	pub id: String,
	/// Short step name, also the step component of its cache key.
	pub title: String,
	/// What happens during the step.
	pub description: String,
	/// Free-form duration, e.g. `2-3 days`.
	pub estimated_time: String,
	/// Artifacts the step produces.
	pub key_outputs: Vec<String>,
	/// Decisions taken during the step.
	pub decisions: Vec<String>,
}

impl WorkflowStep {
	fn from_raw(stakeholder: &str, index: usize, raw: RawWorkflowStep) -> Self {
		Self {
			id: format!("{stakeholder}-step-{index}"),
			title: raw.title,
			description: raw.description,
			estimated_time: raw.estimated_time,
			key_outputs: raw.key_outputs,
			decisions: raw.decisions,
		}
	}
}

/// One stakeholder's fetched workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowSection {
	/// Stakeholder id the section is keyed by.
	pub stakeholder_id: String,
	/// Stakeholder display name.
	pub stakeholder: String,
	/// Whether the steps are shown.
	pub expanded: bool,
	/// Steps in the order the detail source returned them.
	pub steps: Vec<WorkflowStep>,
}

/// Lifecycle of a stakeholder's section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionStatus {
	/// Never fetched, or the fetch failed.
	Uninitialized,
	/// A workflow fetch is outstanding.
	Loading,
	/// Steps are stored.
	Ready {
		/// Whether the steps are shown.
		expanded: bool,
	},
}

/// Permission to fetch one stakeholder's workflow. Not `Clone`: holding it is holding the gate.
#[derive(Debug)]
pub struct WorkflowTicket {
	stakeholder_id: String,
	generation: u64,
	request: WorkflowRequest,
}

impl WorkflowTicket {
	/// Payload for [`DetailSource::workflow`](super::DetailSource::workflow).
	pub fn request(&self) -> &WorkflowRequest {
		&self.request
	}

	/// Stakeholder the fetch is for.
	pub fn stakeholder_id(&self) -> &str {
		&self.stakeholder_id
	}
}

/// What selecting a node asks of the caller.
#[derive(Debug)]
pub enum NodeSelection {
	/// Another stakeholder is loading, or the node is not in the graph.
	Ignored,
	/// Steps were already present; the section is expanded.
	Expanded,
	/// Steps must be fetched with this ticket.
	Fetch(WorkflowTicket),
}

/// Result of handing a completed ticket back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowOutcome {
	/// Steps stored and the section expanded.
	Ready {
		/// Number of steps stored.
		steps: usize,
	},
	/// The ticket belonged to an analysis that has since been replaced.
	Stale,
}

/// Drill-down state for one analyzed graph.
#[derive(Debug, Default)]
pub struct Navigator {
	industry: String,
	graph: Rc<Graph>,
	generation: u64,
	sections: IndexMap<String, WorkflowSection>,
	loading: Option<String>,
	selected_node: Option<String>,
	selected_step: Option<StepRef>,
	expanded_pain_points: HashSet<String>,
	error: Option<ExplorerError>,
}

impl Navigator {
	/// An empty navigator with no graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Start over for a freshly analyzed graph. Outstanding tickets become stale.
	pub fn reset(&mut self, industry: &str, graph: Rc<Graph>) {
		*self = Self {
			industry: industry.trim().to_owned(),
			graph,
			generation: self.generation + 1,
			..Self::default()
		};
	}

	/// Industry of the current graph, trimmed.
	pub fn industry(&self) -> &str {
		&self.industry
	}

	/// The committed graph.
	pub fn graph(&self) -> &Rc<Graph> {
		&self.graph
	}

	/// Bumped on every [`reset`](Self::reset).
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Stakeholder whose workflow is being fetched.
	pub fn loading(&self) -> Option<&str> {
		self.loading.as_deref()
	}

	/// Stakeholder the user last clicked.
	pub fn selected_node(&self) -> Option<&str> {
		self.selected_node.as_deref()
	}

	/// Position of the selected step.
	pub fn selected_step_ref(&self) -> Option<&StepRef> {
		self.selected_step.as_ref()
	}

	/// Message for the error banner.
	pub fn error(&self) -> Option<&ExplorerError> {
		self.error.as_ref()
	}

	/// Replace the banner message.
	pub fn set_error(&mut self, error: ExplorerError) {
		warn!("{error}");
		self.error = Some(error);
	}

	/// Clear the banner message.
	pub fn dismiss_error(&mut self) {
		self.error = None;
	}

	/// Sections in the order their steps were first fetched.
	pub fn sections(&self) -> impl Iterator<Item = &WorkflowSection> {
		self.sections.values()
	}

	/// Section of a stakeholder whose steps were fetched.
	pub fn section(&self, stakeholder_id: &str) -> Option<&WorkflowSection> {
		self.sections.get(stakeholder_id)
	}

	/// Lifecycle state of a stakeholder's section.
	pub fn status(&self, stakeholder_id: &str) -> SectionStatus {
		if self.loading.as_deref() == Some(stakeholder_id) {
			return SectionStatus::Loading;
		}
		match self.sections.get(stakeholder_id) {
			Some(section) => SectionStatus::Ready {
				expanded: section.expanded,
			},
			None => SectionStatus::Uninitialized,
		}
	}

	/// Resolve a step reference.
	pub fn step(&self, step: &StepRef) -> Option<&WorkflowStep> {
		self.sections.get(&step.stakeholder_id)?.steps.get(step.index)
	}

	/// The selected step.
	pub fn selected_step(&self) -> Option<&WorkflowStep> {
		self.step(self.selected_step.as_ref()?)
	}

	/// Cache key of a step in the current industry.
	pub fn key_for(&self, step: &StepRef) -> Option<CacheKey> {
		let section = self.sections.get(&step.stakeholder_id)?;
		let workflow_step = section.steps.get(step.index)?;
		Some(CacheKey::new(
			&self.industry,
			&section.stakeholder,
			&workflow_step.title,
		))
	}

	/// Cache key of the selected step.
	pub fn selected_key(&self) -> Option<CacheKey> {
		self.key_for(self.selected_step.as_ref()?)
	}

	/// Key and request needed to analyze the selected step.
	pub fn pain_point_request(&self) -> Option<(CacheKey, PainPointRequest)> {
		let step_ref = self.selected_step.as_ref()?;
		let section = self.sections.get(&step_ref.stakeholder_id)?;
		let step = section.steps.get(step_ref.index)?;
		Some((
			CacheKey::new(&self.industry, &section.stakeholder, &step.title),
			PainPointRequest {
				industry: self.industry.clone(),
				stakeholder: section.stakeholder.clone(),
				step: step.title.clone(),
				description: step.description.clone(),
			},
		))
	}

	/// React to a click on a graph node.
	pub fn select_node(&mut self, node_id: &str) -> NodeSelection {
		if let Some(loading) = &self.loading {
			debug!("ignoring selection of `{node_id}` while `{loading}` loads");
			return NodeSelection::Ignored;
		}
		let Some(node) = self.graph.node(node_id) else {
			warn!("selection of unknown stakeholder `{node_id}`");
			return NodeSelection::Ignored;
		};
		self.selected_node = Some(node_id.to_owned());

		// a section whose workflow came back empty is fetched again
		if let Some(section) = self
			.sections
			.get_mut(node_id)
			.filter(|section| !section.steps.is_empty())
		{
			section.expanded = true;
			let has_selection = self
				.selected_step
				.as_ref()
				.is_some_and(|s| s.stakeholder_id == node_id);
			if !has_selection {
				self.selected_step = Some(StepRef {
					stakeholder_id: node_id.to_owned(),
					index: 0,
				});
			}
			return NodeSelection::Expanded;
		}

		let request = WorkflowRequest {
			industry: self.industry.clone(),
			stakeholder: node.name.clone(),
			other_stakeholders: self.graph.other_names(node_id),
		};
		info!("fetching workflow for `{}`", node.name);
		self.loading = Some(node_id.to_owned());
		self.error = None;
		NodeSelection::Fetch(WorkflowTicket {
			stakeholder_id: node_id.to_owned(),
			generation: self.generation,
			request,
		})
	}

	/// Apply the result of a workflow fetch to the section the ticket was issued for.
	pub fn complete_workflow(
		&mut self,
		ticket: WorkflowTicket,
		result: Result<Vec<RawWorkflowStep>, FetchError>,
	) -> Result<WorkflowOutcome, ExplorerError> {
		if ticket.generation != self.generation {
			debug!(
				"dropping workflow for `{}` from a replaced analysis",
				ticket.request.stakeholder
			);
			return Ok(WorkflowOutcome::Stale);
		}
		if self.loading.as_deref() == Some(ticket.stakeholder_id.as_str()) {
			self.loading = None;
		}

		let raw_steps = match result {
			Ok(steps) => steps,
			Err(source) => {
				let error = ExplorerError::WorkflowFetch {
					stakeholder: ticket.request.stakeholder,
					source,
				};
				self.set_error(error.clone());
				return Err(error);
			}
		};

		let name = ticket.request.stakeholder;
		let steps: Vec<_> = raw_steps
			.into_iter()
			.enumerate()
			.map(|(i, raw)| WorkflowStep::from_raw(&name, i, raw))
			.collect();
		let count = steps.len();
		self.sections.insert(ticket.stakeholder_id.clone(), WorkflowSection {
			stakeholder_id: ticket.stakeholder_id.clone(),
			stakeholder: name,
			expanded: true,
			steps,
		});

		// auto-select only if the user is still on this stakeholder
		if count > 0 && self.selected_node.as_deref() == Some(ticket.stakeholder_id.as_str()) {
			self.selected_step = Some(StepRef {
				stakeholder_id: ticket.stakeholder_id,
				index: 0,
			});
		}
		Ok(WorkflowOutcome::Ready { steps: count })
	}

	/// Select a step. Returns its cache key, or `None` when the input was ignored.
	pub fn select_step(&mut self, step: StepRef) -> Option<CacheKey> {
		if self.loading.is_some() {
			return None;
		}
		let key = self.key_for(&step)?;
		if let Some(section) = self.sections.get_mut(&step.stakeholder_id) {
			section.expanded = true;
		}
		self.selected_node = Some(step.stakeholder_id.clone());
		self.selected_step = Some(step);
		Some(key)
	}

	/// Flip a section open or closed. Closing the section holding the selected step clears it.
	pub fn toggle_section(&mut self, stakeholder_id: &str) {
		let Some(section) = self.sections.get_mut(stakeholder_id) else {
			return;
		};
		section.expanded = !section.expanded;
		if !section.expanded
			&& self
				.selected_step
				.as_ref()
				.is_some_and(|s| s.stakeholder_id == stakeholder_id)
		{
			self.selected_step = None;
		}
	}

	/// Expand or collapse one pain point's evidence.
	pub fn toggle_pain_point(&mut self, point: &str) {
		if !self.expanded_pain_points.remove(point) {
			self.expanded_pain_points.insert(point.to_owned());
		}
	}

	/// Whether a pain point's evidence is shown.
	pub fn is_pain_point_expanded(&self, point: &str) -> bool {
		self.expanded_pain_points.contains(point)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::RawGraph;
	use serde_json::json;

	fn navigator() -> Navigator {
		let raw = RawGraph::from_value(json!({
			"stakeholders": {
				"ceo": {"name": "CEO", "role": "Executive", "goals": []},
				"cfo": {"name": "CFO", "role": "Finance", "goals": []},
				"cto": {"name": "CTO", "role": "Technology", "goals": []}
			},
			"relationships": [{"from": "cfo", "to": "ceo", "label": "reports to"}]
		}))
		.unwrap();
		let mut nav = Navigator::new();
		nav.reset(" Healthcare ", Rc::new(Graph::from_raw(&raw).unwrap()));
		nav
	}

	fn steps(titles: &[&str]) -> Vec<RawWorkflowStep> {
		titles
			.iter()
			.map(|t| RawWorkflowStep {
				title: t.to_string(),
				..Default::default()
			})
			.collect()
	}

	fn load(nav: &mut Navigator, id: &str, titles: &[&str]) {
		let NodeSelection::Fetch(ticket) = nav.select_node(id) else {
			panic!("expected a fetch");
		};
		nav.complete_workflow(ticket, Ok(steps(titles))).unwrap();
	}

	#[test]
	fn first_selection_requests_workflow_with_other_stakeholders() {
		let mut nav = navigator();
		let NodeSelection::Fetch(ticket) = nav.select_node("cfo") else {
			panic!("expected a fetch");
		};
		assert_eq!(ticket.request(), &WorkflowRequest {
			industry: "Healthcare".into(),
			stakeholder: "CFO".into(),
			other_stakeholders: vec!["CEO".into(), "CTO".into()],
		});
		assert_eq!(nav.status("cfo"), SectionStatus::Loading);

		let outcome = nav
			.complete_workflow(ticket, Ok(steps(&["Approve Budget", "Forecast"])))
			.unwrap();
		assert_eq!(outcome, WorkflowOutcome::Ready { steps: 2 });
		assert_eq!(nav.status("cfo"), SectionStatus::Ready { expanded: true });
		assert_eq!(nav.selected_step().unwrap().id, "CFO-step-0");
		assert_eq!(nav.section("cfo").unwrap().steps[1].id, "CFO-step-1");
	}

	#[test]
	fn other_nodes_are_inert_while_loading() {
		let mut nav = navigator();
		let NodeSelection::Fetch(ticket) = nav.select_node("cfo") else {
			panic!("expected a fetch");
		};
		assert!(matches!(nav.select_node("ceo"), NodeSelection::Ignored));
		assert!(matches!(nav.select_node("cfo"), NodeSelection::Ignored));
		assert_eq!(nav.selected_node(), Some("cfo"));
		nav.complete_workflow(ticket, Ok(steps(&["a"]))).unwrap();
		assert!(matches!(nav.select_node("ceo"), NodeSelection::Fetch(_)));
	}

	#[test]
	fn ready_sections_are_not_refetched() {
		let mut nav = navigator();
		load(&mut nav, "cfo", &["Approve Budget", "Forecast"]);
		nav.select_step(StepRef {
			stakeholder_id: "cfo".into(),
			index: 1,
		});
		nav.toggle_section("cfo");
		assert!(matches!(nav.select_node("cfo"), NodeSelection::Expanded));
		assert_eq!(nav.status("cfo"), SectionStatus::Ready { expanded: true });
		assert_eq!(nav.selected_step().unwrap().title, "Approve Budget");
	}

	#[test]
	fn empty_workflow_is_fetched_again() {
		let mut nav = navigator();
		load(&mut nav, "cfo", &[]);
		assert_eq!(nav.status("cfo"), SectionStatus::Ready { expanded: true });
		assert!(nav.selected_step().is_none());

		let NodeSelection::Fetch(ticket) = nav.select_node("cfo") else {
			panic!("section with no steps must be refetched");
		};
		assert_eq!(nav.status("cfo"), SectionStatus::Loading);
		nav.complete_workflow(ticket, Ok(steps(&["Approve Budget"])))
			.unwrap();
		assert_eq!(nav.sections().count(), 1);
		assert_eq!(nav.selected_step().unwrap().id, "CFO-step-0");
	}

	#[test]
	fn reselecting_keeps_an_existing_step_selection() {
		let mut nav = navigator();
		load(&mut nav, "cfo", &["Approve Budget", "Forecast"]);
		nav.select_step(StepRef {
			stakeholder_id: "cfo".into(),
			index: 1,
		});
		assert!(matches!(nav.select_node("cfo"), NodeSelection::Expanded));
		assert_eq!(nav.selected_step().unwrap().title, "Forecast");
	}

	#[test]
	fn failed_fetch_leaves_section_uninitialized() {
		let mut nav = navigator();
		let NodeSelection::Fetch(ticket) = nav.select_node("cto") else {
			panic!("expected a fetch");
		};
		let err = nav
			.complete_workflow(
				ticket,
				Err(FetchError::Format("`workflow` is not an array".into())),
			)
			.unwrap_err();
		assert!(matches!(err, ExplorerError::WorkflowFetch { .. }));
		assert_eq!(nav.status("cto"), SectionStatus::Uninitialized);
		assert!(nav.section("cto").is_none());
		assert!(nav.error().is_some());
		assert!(nav.loading().is_none());
	}

	#[test]
	fn collapsing_clears_only_a_contained_selection() {
		let mut nav = navigator();
		load(&mut nav, "cfo", &["Approve Budget"]);
		load(&mut nav, "ceo", &["Set Strategy"]);
		assert_eq!(nav.selected_step_ref().unwrap().stakeholder_id, "ceo");

		nav.toggle_section("cfo");
		assert_eq!(nav.selected_step().unwrap().title, "Set Strategy");

		nav.toggle_section("ceo");
		assert!(nav.selected_step().is_none());
	}

	#[test]
	fn late_workflow_from_replaced_graph_is_dropped() {
		let mut nav = navigator();
		let NodeSelection::Fetch(ticket) = nav.select_node("cfo") else {
			panic!("expected a fetch");
		};
		let graph = nav.graph().clone();
		nav.reset("Retail", graph);
		assert!(nav.loading().is_none());
		let outcome = nav.complete_workflow(ticket, Ok(steps(&["a"]))).unwrap();
		assert_eq!(outcome, WorkflowOutcome::Stale);
		assert!(nav.section("cfo").is_none());
	}

	#[test]
	fn cache_key_uses_trimmed_industry_and_stakeholder_name() {
		let mut nav = navigator();
		load(&mut nav, "cfo", &["Approve   Budget"]);
		assert_eq!(
			nav.selected_key(),
			Some(CacheKey::new("healthcare", "cfo", "approve budget"))
		);
		let (_, request) = nav.pain_point_request().unwrap();
		assert_eq!(request.industry, "Healthcare");
		assert_eq!(request.stakeholder, "CFO");
	}

	#[test]
	fn pain_points_toggle_by_text() {
		let mut nav = navigator();
		nav.toggle_pain_point("Manual reconciliation");
		assert!(nav.is_pain_point_expanded("Manual reconciliation"));
		nav.toggle_pain_point("Manual reconciliation");
		assert!(!nav.is_pain_point_expanded("Manual reconciliation"));
	}
}
