//! Report tools: sources with comparison, chat, and the knowledge graph.

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;

use super::report::ReportContext;
use crate::research::report::{MAX_COMPARED, to_bibtex};
use crate::research::{ChatMessage, ChatRole, GeminiClient, ResearchService};

fn bibtex_href(ctx: ReportContext) -> String {
	let bib = ctx.report.with_value(|r| to_bibtex(&r.citations));
	let encoded: String = js_sys::encode_uri_component(&bib).into();
	format!("data:text/plain;charset=utf-8,{encoded}")
}

/// Reference list. Papers can be ticked and compared side by side.
#[component]
pub fn SourcesPanel() -> impl IntoView {
	let ctx = expect_context::<ReportContext>();
	let client = expect_context::<GeminiClient>();
	let comparing = RwSignal::new(false);

	let compare = move |_| {
		let client = client.clone();
		let (papers, context) = ctx.report.with_value(|r| {
			(r.citations_for(ctx.selection.with_untracked(|s| s.selected().to_vec()).as_slice()), r.section_context())
		});
		comparing.set(true);
		spawn_local(async move {
			match client.generate_paper_comparison(&papers, &context).await {
				Ok(c) => ctx.comparison.set(Some(c)),
				Err(e) => ctx.tool_error.set(Some(format!("Failed to compare papers. {e}"))),
			}
			comparing.set(false);
		});
	};

	let toggle = move |id: u32| {
		let result = ctx.selection.try_update(|s| s.toggle(id));
		if let Some(Err(full)) = result {
			ctx.tool_error.set(Some(full.to_string()));
		}
	};

	let citations = ctx.report.with_value(|r| r.citations.clone());

	view! {
		<div class="sources-panel">
			<div class="panel-actions">
				<span>{move || format!("{}/{MAX_COMPARED} selected", ctx.selection.with(|s| s.selected().len()))}</span>
				<button
					on:click=compare
					disabled=move || comparing.get() || !ctx.selection.with(|s| s.can_compare())
				>
					{move || if comparing.get() { "Comparing..." } else { "Compare" }}
				</button>
				<a class="button" download="citations.bib" href=move || bibtex_href(ctx)>
					"Export BibTeX"
				</a>
			</div>
			<ul class="citations">
				{citations
					.into_iter()
					.map(|c| {
						let id = c.id;
						view! {
							<li
								id=format!("citation-{id}")
								class=move || {
									if ctx.active_citation.get() == Some(u64::from(id)) { "citation active" } else { "citation" }
								}
							>
								<input
									type="checkbox"
									prop:checked=move || ctx.selection.with(|s| s.contains(id))
									on:change=move |_| toggle(id)
								/>
								<span class="marker">{format!("[{id}]")}</span>
								<span class="title">{c.title}</span>
								<div class="meta">{format!("{} · {} · {}", c.authors, c.journal, c.year)}</div>
								{c.doi
									.map(|doi| {
										view! {
											<a href=format!("https://doi.org/{doi}") target="_blank" rel="noopener">
												{doi.clone()}
											</a>
										}
									})}
							</li>
						}
					})
					.collect_view()}
			</ul>
		</div>
	}
}

/// Questions about the report, answered from its content.
#[component]
pub fn ChatPanel() -> impl IntoView {
	let ctx = expect_context::<ReportContext>();
	let client = expect_context::<GeminiClient>();
	let history = ctx.chat;
	let input = RwSignal::new(String::new());
	let waiting = RwSignal::new(false);

	let send = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		let question = input.get_untracked().trim().to_string();
		if question.is_empty() || waiting.get_untracked() {
			return;
		}
		let client = client.clone();
		let previous = history.get_untracked();
		let report = ctx.report.get_value();
		history.update(|h| h.push(ChatMessage::user(question.clone())));
		input.set(String::new());
		waiting.set(true);
		spawn_local(async move {
			let answer = client.query_report_context(&question, &report, &previous).await;
			history.update(|h| h.push(ChatMessage::model(answer)));
			waiting.set(false);
		});
	};

	view! {
		<div class="chat-panel">
			<ul class="messages">
				<For
					each=move || history.get().into_iter().enumerate()
					key=|(i, _)| *i
					children=|(_, msg)| {
						let class = match msg.role {
							ChatRole::User => "message user",
							ChatRole::Model => "message model",
						};
						view! { <li class=class>{msg.content}</li> }
					}
				/>
				<Show when=move || waiting.get()>
					<li class="message model pending">"Thinking..."</li>
				</Show>
			</ul>
			<form on:submit=send>
				<input
					type="text"
					placeholder="Ask about this report"
					prop:value=move || input.get()
					on:input=move |ev| input.set(event_target_value(&ev))
				/>
				<button type="submit" disabled=move || waiting.get()>"Send"</button>
			</form>
		</div>
	}
}

/// Knowledge graph extracted from the report.
#[component]
pub fn NetworkPanel() -> impl IntoView {
	let ctx = expect_context::<ReportContext>();
	let client = expect_context::<GeminiClient>();
	let generating = RwSignal::new(false);

	let generate = move |_| {
		let client = client.clone();
		let context = ctx.report.with_value(|r| r.section_context());
		generating.set(true);
		spawn_local(async move {
			match client.generate_knowledge_graph(&context).await {
				Ok(graph) => {
					debug!("extracted graph: {} nodes, {} edges", graph.node_count(), graph.edge_count());
					ctx.graph.set(Some(graph));
					ctx.show_graph.set(true);
				}
				Err(e) => ctx.tool_error.set(Some(format!("Failed to generate knowledge graph. {e}"))),
			}
			generating.set(false);
		});
	};

	view! {
		<div class="network-panel">
			<p>"Extract the entities and relationships in this report as a graph."</p>
			<button on:click=generate disabled=move || generating.get()>
				{move || if generating.get() { "Extracting..." } else { "Generate graph" }}
			</button>
			{move || {
				ctx.graph
					.with(|g| g.as_ref().map(|g| (g.node_count(), g.edge_count())))
					.map(|(nodes, edges)| {
						view! {
							<div class="graph-stats">
								<span>{format!("{nodes} nodes")}</span>
								<span>{format!("{edges} edges")}</span>
								<button on:click=move |_| ctx.show_graph.set(true)>"Open full screen"</button>
							</div>
						}
					})
			}}
		</div>
	}
}
