use std::rc::Rc;

use leptos::ev::KeyboardEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;

use crate::components::force_graph::ForceGraphCanvas;
use crate::components::workflow::{ExplorerHandle, WorkflowExplorer};
use crate::config::ExplorerConfig;
use crate::drilldown::{AnalysisOutcome, Explorer};
use crate::error::ExplorerError;
use crate::graph::{Graph, Node};
use crate::sources::HttpSource;

#[component]
fn Details(explorer: ExplorerHandle, revision: RwSignal<u64>) -> impl IntoView {
	let node = move || -> Option<Node> {
		revision.track();
		explorer.with_value(|e| {
			let nav = e.navigator();
			let id = nav.selected_node()?;
			nav.graph().node(id).cloned()
		})
	};

	view! {
		<aside class="details-panel">
			{move || match node() {
				Some(node) => {
					view! {
						<h2>{node.name}</h2>
						<p class="role">{node.role}</p>
						<h3>"Goals"</h3>
						<ul>{node.goals.into_iter().map(|g| view! { <li>{g}</li> }).collect_view()}</ul>
					}
						.into_any()
				}
				None => view! { <p class="hint">"Click a stakeholder to see their role and goals."</p> }.into_any(),
			}}
		</aside>
	}
}

/// Industry query, stakeholder graph and workflow drill-down.
#[component]
pub fn Home() -> impl IntoView {
	let config = ExplorerConfig::from_env();
	let source = Rc::new(HttpSource::new(config.endpoints.clone()));
	let explorer = Explorer::new(&config, source.clone(), source);

	// bumped by the session on every change; views re-read through it
	let revision = RwSignal::new(0_u64);
	explorer.set_listener(move || revision.update(|r| *r = r.wrapping_add(1)));
	let explorer: ExplorerHandle = StoredValue::new_local(explorer);

	let industry = RwSignal::new(String::new());
	let analyzing = move || {
		revision.track();
		explorer.with_value(|e| e.is_analyzing())
	};
	let analyze = move || {
		let explorer = explorer.get_value();
		let query = industry.get_untracked();
		spawn_local(async move {
			if let Ok(AnalysisOutcome::Committed { truncation }) = explorer.analyze(&query).await {
				debug!("analysis committed, truncated: {}", truncation.is_some());
			}
		});
	};

	// only a new analysis generation replaces the canvas layout
	let graph_memo = Memo::new(move |_| {
		revision.track();
		explorer.with_value(|e| {
			let graph = e.graph();
			(!graph.is_empty()).then(|| (e.navigator().generation(), Graph::clone(&graph)))
		})
	});
	let graph = Signal::derive(move || graph_memo.get().map(|(_, graph)| graph));
	let selected = Signal::derive(move || {
		revision.track();
		explorer.with_value(|e| e.navigator().selected_node().map(str::to_owned))
	});
	let on_select = Callback::new(move |id: String| {
		let explorer = explorer.get_value();
		spawn_local(async move {
			// failures land in the navigator's error banner
			if let Err(err) = explorer.select_node(&id).await {
				debug!("selecting `{id}` failed: {err}");
			}
		});
	});

	let error = move || {
		revision.track();
		explorer.with_value(|e| e.navigator().error().map(ExplorerError::user_message))
	};
	let truncation = move || {
		revision.track();
		explorer.with_value(|e| e.truncation().map(|t| t.to_string()))
	};

	view! {
		<div class="explorer">
			<header class="explorer-header">
				<h1>"Stakeholder Analysis"</h1>
				<div class="query">
					<input
						type="text"
						placeholder="Enter an industry or use-case"
						prop:value=move || industry.get()
						on:input=move |ev| industry.set(event_target_value(&ev))
						on:keydown=move |ev: KeyboardEvent| {
							if ev.key() == "Enter" {
								analyze();
							}
						}
					/>
					<button on:click=move |_| analyze() disabled=analyzing>
						{move || if analyzing() { "Analyzing..." } else { "Analyze" }}
					</button>
				</div>
			</header>

			{move || {
				error()
					.map(|message| {
						view! {
							<div class="error-banner" role="alert">
								<span>{message}</span>
								<button
									class="dismiss"
									aria-label="Dismiss"
									on:click=move |_| explorer.with_value(|e| e.dismiss_error())
								>
									"×"
								</button>
							</div>
						}
					})
			}}
			{move || truncation().map(|text| view! { <div class="truncation-warning">{text}</div> })}

			<main class="explorer-body">
				<section class="graph-panel">
					<ForceGraphCanvas
						graph=graph
						selected=selected
						on_select=on_select
						layout=config.layout.clone()
					/>
					<p class="legend">
						"Click a stakeholder to load their workflow. Drag nodes to reposition. Scroll to zoom. Drag background to pan."
					</p>
				</section>
				<Details explorer=explorer revision=revision />
			</main>

			<WorkflowExplorer explorer=explorer revision=revision />
		</div>
	}
}
