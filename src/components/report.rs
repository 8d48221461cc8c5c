//! Results screen: the report body plus the tool sidebar and modals.

use leptos::prelude::*;
use leptos::task::spawn_local;

use super::force_graph::KnowledgeGraphCanvas;
use super::sidebar::{ChatPanel, NetworkPanel, SourcesPanel};
use crate::graph::KnowledgeGraph;
use crate::research::report::{ComparisonPoint, split_citations};
use crate::research::{
	ChatMessage, CitationSelection, ExperimentalPlan, GeminiClient, PaperComparison, ResearchReport,
	ResearchService, TextSegment,
};

/// Which sidebar tool is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SidebarTab {
	/// Reference list and comparison picker.
	Sources,
	/// Questions about the report.
	Chat,
	/// Knowledge graph.
	Network,
}

/// Everything the report screen and its tools share.
#[derive(Clone, Copy)]
pub struct ReportContext {
	/// The report being shown.
	pub report: StoredValue<ResearchReport>,
	/// Open sidebar tab.
	pub tab: RwSignal<SidebarTab>,
	/// Citation last clicked in the text.
	pub active_citation: RwSignal<Option<u64>>,
	/// Last tool failure, shown as a dismissible banner.
	pub tool_error: RwSignal<Option<String>>,
	/// Papers ticked for comparison.
	pub selection: RwSignal<CitationSelection>,
	/// Comparison result, when open.
	pub comparison: RwSignal<Option<PaperComparison>>,
	/// Extracted graph, once generated.
	pub graph: RwSignal<Option<KnowledgeGraph>>,
	/// Whether the full-screen graph is open.
	pub show_graph: RwSignal<bool>,
	/// Chat so far; survives switching tabs.
	pub chat: RwSignal<Vec<ChatMessage>>,
}

fn focus_citation(ctx: ReportContext, id: u64) {
	ctx.tab.set(SidebarTab::Sources);
	ctx.active_citation.set(Some(id));
	request_animation_frame(move || {
		if let Some(el) = document().get_element_by_id(&format!("citation-{id}")) {
			el.scroll_into_view();
		}
	});
}

fn section_body(content: &str, ctx: ReportContext) -> impl IntoView + use<> {
	split_citations(content)
		.into_iter()
		.map(|segment| match segment {
			TextSegment::Text(text) => view! { <span>{text}</span> }.into_any(),
			TextSegment::Citation(id) => view! {
				<button
					class=move || {
						if ctx.active_citation.get() == Some(id) { "cite-marker active" } else { "cite-marker" }
					}
					on:click=move |_| focus_citation(ctx, id)
				>
					{format!("[{id}]")}
				</button>
			}
			.into_any(),
		})
		.collect_view()
}

/// The generated report with its tools.
#[component]
pub fn ReportView(
	/// Report to show.
	report: ResearchReport,
	/// Called when the user leaves the results.
	on_back: Callback<()>,
) -> impl IntoView {
	let client = expect_context::<GeminiClient>();
	let ctx = ReportContext {
		report: StoredValue::new(report),
		tab: RwSignal::new(SidebarTab::Sources),
		active_citation: RwSignal::new(None),
		tool_error: RwSignal::new(None),
		selection: RwSignal::new(CitationSelection::default()),
		comparison: RwSignal::new(None),
		graph: RwSignal::new(None),
		show_graph: RwSignal::new(false),
		chat: RwSignal::new(Vec::new()),
	};
	provide_context(ctx);

	let plan = RwSignal::new(None::<ExperimentalPlan>);
	let plan_loading = RwSignal::new(false);
	let generate_plan = move |_| {
		let client = client.clone();
		plan_loading.set(true);
		let (hypothesis, context) = ctx.report.with_value(|r| (r.novel_hypothesis.clone(), r.section_context()));
		spawn_local(async move {
			match client.generate_experimental_plan(&hypothesis, &context).await {
				Ok(p) => plan.set(Some(p)),
				Err(e) => ctx.tool_error.set(Some(format!("Failed to generate experimental plan. {e}"))),
			}
			plan_loading.set(false);
		});
	};

	let (title, summary, hypothesis, sections) = ctx.report.with_value(|r| {
		(r.title.clone(), r.summary.clone(), r.novel_hypothesis.clone(), r.sections.clone())
	});

	view! {
		<div class="report-screen">
			<header class="report-header">
				<button class="back" on:click=move |_| on_back.run(())>"←"</button>
				<div>
					<span class="eyebrow">"Report Generated"</span>
					<h1>{title}</h1>
				</div>
			</header>

			{move || {
				ctx.tool_error
					.get()
					.map(|msg| {
						view! {
							<div class="tool-error" role="alert">
								<span>{msg}</span>
								<button on:click=move |_| ctx.tool_error.set(None)>"✕"</button>
							</div>
						}
					})
			}}

			<div class="report-body">
				<article class="report-content">
					<section>
						<h2>"Executive Summary"</h2>
						<p>{summary}</p>
					</section>
					{sections
						.into_iter()
						.enumerate()
						.map(|(i, s)| {
							view! {
								<section>
									<h3>
										<span class="section-number">{format!("{:02}", i + 1)}</span>
										{s.heading}
									</h3>
									<p>{section_body(&s.content, ctx)}</p>
								</section>
							}
						})
						.collect_view()}
					<div class="hypothesis">
						<h3>"Novel Hypothesis"</h3>
						<blockquote>{format!("\"{hypothesis}\"")}</blockquote>
						<button on:click=generate_plan disabled=move || plan_loading.get()>
							{move || if plan_loading.get() { "Designing protocol..." } else { "Generate experimental plan" }}
						</button>
					</div>
				</article>

				<aside class="report-tools">
					<nav class="tabs">
						<TabButton tab=SidebarTab::Sources label="Sources" />
						<TabButton tab=SidebarTab::Chat label="Chat" />
						<TabButton tab=SidebarTab::Network label="Network" />
					</nav>
					{move || match ctx.tab.get() {
						SidebarTab::Sources => view! { <SourcesPanel /> }.into_any(),
						SidebarTab::Chat => view! { <ChatPanel /> }.into_any(),
						SidebarTab::Network => view! { <NetworkPanel /> }.into_any(),
					}}
				</aside>
			</div>

			{move || plan.get().map(|p| view! { <PlanModal plan=p on_close=Callback::new(move |_| plan.set(None)) /> })}
			{move || {
				ctx.comparison
					.get()
					.map(|c| view! { <ComparisonModal comparison=c on_close=Callback::new(move |_| ctx.comparison.set(None)) /> })
			}}
			{move || {
				(ctx.show_graph.get() && ctx.graph.with(Option::is_some))
					.then(|| {
						let graph = Signal::derive(move || ctx.graph.get().unwrap_or_default());
						view! {
							<div class="modal graph-modal">
								<button class="close" on:click=move |_| ctx.show_graph.set(false)>"✕"</button>
								<KnowledgeGraphCanvas graph=graph fullscreen=true />
							</div>
						}
					})
			}}
		</div>
	}
}

#[component]
fn TabButton(tab: SidebarTab, label: &'static str) -> impl IntoView {
	let ctx = expect_context::<ReportContext>();
	view! {
		<button
			class=move || if ctx.tab.get() == tab { "tab active" } else { "tab" }
			on:click=move |_| ctx.tab.set(tab)
		>
			{label}
		</button>
	}
}

#[component]
fn PlanModal(plan: ExperimentalPlan, on_close: Callback<()>) -> impl IntoView {
	view! {
		<div class="modal plan-modal">
			<header>
				<h2>{plan.title}</h2>
				<button class="close" on:click=move |_| on_close.run(())>"✕"</button>
			</header>
			<p class="objective">{plan.objective}</p>
			<ol class="steps">
				{plan
					.steps
					.into_iter()
					.map(|s| {
						view! {
							<li value=s.step_number.to_string()>
								<strong>{s.action}</strong>
								<div class="conditions">{s.conditions}</div>
								<div class="equipment">{s.equipment}</div>
							</li>
						}
					})
					.collect_view()}
			</ol>
			<div class="safety">
				<h3>"Safety"</h3>
				<ul>{plan.safety_warnings.into_iter().map(|w| view! { <li>{w}</li> }).collect_view()}</ul>
			</div>
		</div>
	}
}

#[component]
fn ComparisonModal(comparison: PaperComparison, on_close: Callback<()>) -> impl IntoView {
	let ctx = expect_context::<ReportContext>();
	let papers = ctx
		.report
		.with_value(|r| r.citations_for(ctx.selection.with_untracked(|s| s.selected().to_vec()).as_slice()));
	let ids: Vec<u32> = papers.iter().map(|c| c.id).collect();

	let row = move |point: ComparisonPoint, ids: Vec<u32>| {
		view! {
			<tr>
				<th scope="row">{point.attribute.clone()}</th>
				{ids
					.into_iter()
					.map(|id| view! { <td>{point.value_for(id).unwrap_or("Not Specified").to_string()}</td> })
					.collect_view()}
			</tr>
		}
	};

	view! {
		<div class="modal comparison-modal">
			<header>
				<h2>"Paper Comparison"</h2>
				<button class="close" on:click=move |_| on_close.run(())>"✕"</button>
			</header>
			<p class="summary">{comparison.summary}</p>
			<table>
				<thead>
					<tr>
						<th>"Attribute"</th>
						{papers
							.into_iter()
							.map(|c| {
								view! {
									<th>
										<span class="marker">{format!("[{}]", c.id)}</span>
										{c.title}
										<div class="authors">{format!("{} ({})", c.authors, c.year)}</div>
									</th>
								}
							})
							.collect_view()}
					</tr>
				</thead>
				<tbody>{comparison.points.into_iter().map(|p| row(p, ids.clone())).collect_view()}</tbody>
			</table>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn context() -> ReportContext {
		ReportContext {
			report: StoredValue::new(ResearchReport {
				title: "T".into(),
				summary: "S".into(),
				sections: vec![],
				novel_hypothesis: "H".into(),
				citations: vec![],
			}),
			tab: RwSignal::new(SidebarTab::Sources),
			active_citation: RwSignal::new(None),
			tool_error: RwSignal::new(None),
			selection: RwSignal::new(CitationSelection::default()),
			comparison: RwSignal::new(None),
			graph: RwSignal::new(None),
			show_graph: RwSignal::new(false),
			chat: RwSignal::new(Vec::new()),
		}
	}

	#[test]
	fn section_view_outlives_its_text() {
		let owner = Owner::new();
		owner.set();
		let ctx = context();
		let views: Vec<_> = ["Garnets [1].", "See [2][99999999999]."]
			.iter()
			.map(|text| {
				let content = text.to_string();
				section_body(&content, ctx)
			})
			.collect();
		assert_eq!(views.len(), 2);
	}
}
