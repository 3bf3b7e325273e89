//! The explorer handle: one analysis session wired to its collaborators.
//!
//! [`Explorer`] owns the navigation store and the pain-point cache and drives the async calls
//! that feed them. It is cheap to clone; clones share state. Borrows of the stores are never
//! held across an `.await`.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use futures::FutureExt;
use log::{debug, info};

use super::cache::{AnalysisResult, CacheKey, PainPointCache};
use super::selection::{NodeSelection, Navigator, StepRef};
use super::source::{
	DetailSource, GraphSource, PainPointAnalysis, PainPointRequest, parse_pain_points,
	parse_workflow,
};
use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, FetchError};
use crate::graph::{Graph, RawGraph, Truncation, reduce};

/// How an analysis request ended when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisOutcome {
	/// The graph was committed, possibly pruned.
	Committed {
		/// Set when the graph was pruned to the node limit.
		truncation: Option<Truncation>,
	},
	/// A newer request was issued while this one was in flight.
	Superseded,
}

struct Session {
	graph_source: Rc<dyn GraphSource>,
	detail_source: Rc<dyn DetailSource>,
	max_nodes: usize,
	navigator: RefCell<Navigator>,
	cache: RefCell<PainPointCache>,
	truncation: RefCell<Option<Truncation>>,
	latest_request: Cell<u64>,
	analyzing: Cell<bool>,
	listener: RefCell<Option<Rc<dyn Fn()>>>,
}

/// Shared handle to one analysis session.
#[derive(Clone)]
pub struct Explorer {
	session: Rc<Session>,
}

impl Explorer {
	/// A session with an empty graph.
	pub fn new(
		config: &ExplorerConfig,
		graph_source: Rc<dyn GraphSource>,
		detail_source: Rc<dyn DetailSource>,
	) -> Self {
		Self {
			session: Rc::new(Session {
				graph_source,
				detail_source,
				max_nodes: config.max_nodes(),
				navigator: RefCell::new(Navigator::new()),
				cache: RefCell::new(PainPointCache::new()),
				truncation: RefCell::new(None),
				latest_request: Cell::new(0),
				analyzing: Cell::new(false),
				listener: RefCell::new(None),
			}),
		}
	}

	/// Called after every state change; the UI uses it to schedule a re-render.
	pub fn set_listener(&self, listener: impl Fn() + 'static) {
		*self.session.listener.borrow_mut() = Some(Rc::new(listener));
	}

	fn notify(&self) {
		let listener = self.session.listener.borrow().clone();
		if let Some(listener) = listener {
			listener();
		}
	}

	/// Borrow the navigation state. Drop the borrow before calling back into the explorer.
	pub fn navigator(&self) -> Ref<'_, Navigator> {
		self.session.navigator.borrow()
	}

	/// Borrow the pain-point cache.
	pub fn cache(&self) -> Ref<'_, PainPointCache> {
		self.session.cache.borrow()
	}

	/// The committed graph.
	pub fn graph(&self) -> Rc<Graph> {
		self.session.navigator.borrow().graph().clone()
	}

	/// Pruning notice of the committed graph.
	pub fn truncation(&self) -> Option<Truncation> {
		self.session.truncation.borrow().clone()
	}

	/// Whether a graph request is outstanding.
	pub fn is_analyzing(&self) -> bool {
		self.session.analyzing.get()
	}

	fn fail(&self, error: ExplorerError) -> ExplorerError {
		self.session.navigator.borrow_mut().set_error(error.clone());
		self.notify();
		error
	}

	/// Fetch, validate and reduce the graph for an industry query, then start a fresh session
	/// over it. On failure the previous graph, selection and cache stay as they were.
	pub async fn analyze(&self, industry: &str) -> Result<AnalysisOutcome, ExplorerError> {
		let query = industry.trim().to_owned();
		if query.is_empty() {
			return Err(self.fail(ExplorerError::EmptyIndustry));
		}

		let request = self.session.latest_request.get() + 1;
		self.session.latest_request.set(request);
		self.session.analyzing.set(true);
		self.session.navigator.borrow_mut().dismiss_error();
		self.notify();
		info!("analyzing stakeholders for `{query}`");

		let fetched = self.session.graph_source.stakeholders(&query).await;
		if self.session.latest_request.get() != request {
			debug!("discarding superseded analysis of `{query}`");
			return Ok(AnalysisOutcome::Superseded);
		}
		self.session.analyzing.set(false);

		let graph = fetched
			.and_then(|payload| RawGraph::from_value(payload).map_err(FetchError::from))
			.map_err(ExplorerError::GraphFetch)
			.and_then(|raw| Graph::from_raw(&raw).map_err(ExplorerError::from));
		let graph = match graph {
			Ok(graph) => graph,
			Err(error) => return Err(self.fail(error)),
		};

		let reduced = reduce(graph, self.session.max_nodes);
		info!(
			"committed graph with {} stakeholders and {} relationships",
			reduced.graph.len(),
			reduced.graph.edges().len()
		);
		self.session
			.navigator
			.borrow_mut()
			.reset(&query, Rc::new(reduced.graph));
		self.session.cache.borrow_mut().clear();
		*self.session.truncation.borrow_mut() = reduced.truncation.clone();
		self.notify();
		Ok(AnalysisOutcome::Committed {
			truncation: reduced.truncation,
		})
	}

	/// Select a stakeholder, fetching its workflow the first time.
	pub async fn select_node(&self, node_id: &str) -> Result<(), ExplorerError> {
		let selection = self.session.navigator.borrow_mut().select_node(node_id);
		self.notify();
		let ticket = match selection {
			NodeSelection::Ignored | NodeSelection::Expanded => return Ok(()),
			NodeSelection::Fetch(ticket) => ticket,
		};

		let result = self
			.session
			.detail_source
			.workflow(ticket.request())
			.await
			.and_then(parse_workflow);
		let outcome = self
			.session
			.navigator
			.borrow_mut()
			.complete_workflow(ticket, result);
		self.notify();
		outcome.map(|_| ())
	}

	/// Select a step and return its analysis if one is already cached. Never calls out.
	pub fn select_step(&self, step: StepRef) -> Option<Rc<PainPointAnalysis>> {
		let key = self.session.navigator.borrow_mut().select_step(step);
		self.notify();
		self.session.cache.borrow().get(&key?)
	}

	/// Analysis for the selected step, if it has been fetched.
	pub fn current_analysis(&self) -> Option<Rc<PainPointAnalysis>> {
		let key = self.session.navigator.borrow().selected_key()?;
		self.session.cache.borrow().get(&key)
	}

	/// Whether the selected step has an analysis request outstanding.
	pub fn is_step_pending(&self) -> bool {
		let Some(key) = self.session.navigator.borrow().selected_key() else {
			return false;
		};
		self.session.cache.borrow().is_pending(&key)
	}

	/// Request pain points for the selected step. Served from the cache when possible; a request
	/// already running for the same key is joined.
	pub async fn analyze_step(&self) -> Result<Option<Rc<PainPointAnalysis>>, ExplorerError> {
		let request = self.session.navigator.borrow().pain_point_request();
		let Some((key, request)) = request else {
			return Ok(None);
		};
		self.fetch_analysis(key, request).await.map(Some)
	}

	async fn fetch_analysis(&self, key: CacheKey, request: PainPointRequest) -> AnalysisResult {
		let (pending, generation) = {
			let mut cache = self.session.cache.borrow_mut();
			if let Some(hit) = cache.get(&key) {
				return Ok(hit);
			}
			let generation = cache.generation();
			let pending = match cache.pending(&key) {
				Some(pending) => {
					debug!("joining in-flight analysis for {key}");
					pending
				}
				None => {
					debug!("analyzing {key}");
					let source = self.session.detail_source.clone();
					let pending = async move {
						let step = request.step.clone();
						source
							.pain_points(&request)
							.await
							.and_then(parse_pain_points)
							.map(Rc::new)
							.map_err(|source| ExplorerError::PainPointFetch { step, source })
					}
					.boxed_local()
					.shared();
					cache.track(key.clone(), pending.clone());
					pending
				}
			};
			(pending, generation)
		};
		self.notify();

		let result = pending.await;
		self.session
			.cache
			.borrow_mut()
			.settle(&key, generation, &result);
		if let Err(error) = &result {
			if self.session.cache.borrow().generation() == generation {
				self.session.navigator.borrow_mut().set_error(error.clone());
			}
		}
		self.notify();
		result
	}

	/// See [`Navigator::toggle_section`].
	pub fn toggle_section(&self, stakeholder_id: &str) {
		self.session
			.navigator
			.borrow_mut()
			.toggle_section(stakeholder_id);
		self.notify();
	}

	/// See [`Navigator::toggle_pain_point`].
	pub fn toggle_pain_point(&self, point: &str) {
		self.session.navigator.borrow_mut().toggle_pain_point(point);
		self.notify();
	}

	/// Clear the error banner.
	pub fn dismiss_error(&self) {
		self.session.navigator.borrow_mut().dismiss_error();
		self.notify();
	}
}
