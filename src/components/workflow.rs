//! Workflow sections, step details and pain-point evidence for the drill-down panel.

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;

use crate::drilldown::{Explorer, PainPoint, SourceMention, StepRef, WorkflowSection, WorkflowStep};

/// Shared handle to the session, readable from any view closure.
pub type ExplorerHandle = StoredValue<Explorer, LocalStorage>;

/// Workflow sections of every fetched stakeholder with the selected step's analysis.
#[component]
pub fn WorkflowExplorer(explorer: ExplorerHandle, revision: RwSignal<u64>) -> impl IntoView {
	let sections = move || {
		revision.track();
		explorer.with_value(|e| e.navigator().sections().cloned().collect::<Vec<_>>())
	};
	let loading = move || {
		revision.track();
		explorer.with_value(|e| {
			let nav = e.navigator();
			let id = nav.loading()?;
			nav.graph().node(id).map(|node| node.name.clone())
		})
	};

	view! {
		<section class="workflow-explorer">
			<h2>"Workflow Explorer"</h2>
			{move || {
				loading()
					.map(|name| {
						view! { <p class="workflow-loading">"Loading workflow for " {name} "..."</p> }
					})
			}}
			<div class="workflow-layout">
				<div class="workflow-sections">
					{move || {
						let sections = sections();
						if sections.is_empty() {
							return view! {
								<p class="hint">"Select a stakeholder in the graph to see their workflow."</p>
							}
								.into_any();
						}
						sections
							.into_iter()
							.map(|section| view! { <SectionView explorer=explorer revision=revision section=section /> })
							.collect_view()
							.into_any()
					}}
				</div>
				<StepDetail explorer=explorer revision=revision />
			</div>
		</section>
	}
}

#[component]
fn SectionView(
	explorer: ExplorerHandle,
	revision: RwSignal<u64>,
	section: WorkflowSection,
) -> impl IntoView {
	let id = section.stakeholder_id.clone();
	let toggle = move |_| explorer.with_value(|e| e.toggle_section(&id));
	let selected = move || {
		revision.track();
		explorer.with_value(|e| e.navigator().selected_step_ref().cloned())
	};
	let owner = section.stakeholder_id.clone();
	let count = format!("{} steps", section.steps.len());

	view! {
		<div class="workflow-section" class:expanded=section.expanded>
			<button class="section-header" on:click=toggle>
				<span class="chevron">{if section.expanded { "▾" } else { "▸" }}</span>
				<span class="section-title">{section.stakeholder.clone()}</span>
				<span class="step-count">{count}</span>
			</button>
			{section
				.expanded
				.then(|| {
					view! {
						<ol class="workflow-steps">
							{section
								.steps
								.into_iter()
								.enumerate()
								.map(|(index, step)| {
									let step_ref = StepRef {
										stakeholder_id: owner.clone(),
										index,
									};
									let active_ref = step_ref.clone();
									let is_active = move || selected().as_ref() == Some(&active_ref);
									view! {
										<li>
											<button
												class="workflow-step"
												class:active=is_active
												on:click=move |_| {
													let step = step_ref.clone();
													explorer
														.with_value(|e| {
															if e.select_step(step).is_some() {
																debug!("showing cached analysis");
															}
														});
												}
											>
												<span class="step-index">{index + 1}</span>
												<span class="step-title">{step.title}</span>
											</button>
										</li>
									}
								})
								.collect_view()}
						</ol>
					}
				})}
		</div>
	}
}

#[component]
fn StepDetail(explorer: ExplorerHandle, revision: RwSignal<u64>) -> impl IntoView {
	let step = move || {
		revision.track();
		explorer.with_value(|e| e.navigator().selected_step().cloned())
	};

	view! {
		<div class="step-detail">
			{move || match step() {
				Some(step) => view! { <StepCard explorer=explorer revision=revision step=step /> }.into_any(),
				None => view! { <p class="hint">"Select a step to see its details."</p> }.into_any(),
			}}
		</div>
	}
}

fn bullet_list(items: Vec<String>) -> impl IntoView {
	view! { <ul>{items.into_iter().map(|item| view! { <li>{item}</li> }).collect_view()}</ul> }
}

#[component]
fn StepCard(explorer: ExplorerHandle, revision: RwSignal<u64>, step: WorkflowStep) -> impl IntoView {
	let analysis = move || {
		revision.track();
		explorer.with_value(|e| e.current_analysis())
	};
	let pending = move || {
		revision.track();
		explorer.with_value(|e| e.is_step_pending())
	};
	let analyze = move |_| {
		let explorer = explorer.get_value();
		spawn_local(async move {
			// failures land in the navigator's error banner
			if let Ok(Some(analysis)) = explorer.analyze_step().await {
				debug!("{} pain points", analysis.pain_points.len());
			}
		});
	};

	view! {
		<article class="step-card">
			<h3>{step.title}</h3>
			<p class="step-description">{step.description}</p>
			<dl>
				<dt>"Estimated time"</dt>
				<dd>{step.estimated_time}</dd>
				<dt>"Key outputs"</dt>
				<dd>{bullet_list(step.key_outputs)}</dd>
				<dt>"Decisions"</dt>
				<dd>{bullet_list(step.decisions)}</dd>
			</dl>
			{move || match analysis() {
				Some(analysis) => view! { <PainPoints explorer=explorer revision=revision pain_points=analysis.ranked() /> }.into_any(),
				None => {
					view! {
						<button class="analyze-step" on:click=analyze disabled=pending>
							{move || if pending() { "Analyzing..." } else { "Analyze Pain Points" }}
						</button>
					}
						.into_any()
				}
			}}
		</article>
	}
}

#[component]
fn PainPoints(
	explorer: ExplorerHandle,
	revision: RwSignal<u64>,
	pain_points: Vec<PainPoint>,
) -> impl IntoView {
	if pain_points.is_empty() {
		return view! { <p class="hint">"No pain points reported for this step."</p> }.into_any();
	}

	view! {
		<ul class="pain-points">
			{pain_points
				.into_iter()
				.map(|point| {
					let text = point.point.clone();
					let expanded = {
						let text = text.clone();
						move || {
							revision.track();
							explorer.with_value(|e| e.navigator().is_pain_point_expanded(&text))
						}
					};
					let toggle = {
						let text = text.clone();
						move |_| explorer.with_value(|e| e.toggle_pain_point(&text))
					};
					let sources = point.sources;
					let count = format!("{} sources", sources.len());
					view! {
						<li class="pain-point">
							<button class="pain-point-header" on:click=toggle>
								{text}
								<span class="source-count">{count}</span>
							</button>
							{move || {
								expanded()
									.then(|| {
										sources
											.iter()
											.cloned()
											.map(|mention| view! { <Mention mention=mention /> })
											.collect_view()
									})
							}}
						</li>
					}
				})
				.collect_view()}
		</ul>
	}
		.into_any()
}

#[component]
fn Mention(mention: SourceMention) -> impl IntoView {
	let platform = mention.platform_kind();
	let date = mention.display_date();
	view! {
		<blockquote class="mention">
			<header>
				<span class=format!("platform {}", platform.class())>{platform.label()}</span>
				<a href=mention.url target="_blank" rel="noopener noreferrer">
					{mention.title}
				</a>
				<time>{date}</time>
			</header>
			<p>{mention.evidence}</p>
		</blockquote>
	}
}
