use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use crate::app_state::{AppEvent, AppState, AppView};
use crate::components::report::ReportView;
use crate::components::research_form::ResearchForm;
use crate::research::{GeminiClient, ResearchParams, ResearchService};

const STAGES: [&str; 4] = [
	"Initializing research agent",
	"Querying patent and journal databases",
	"Analyzing abstracts and filtering noise",
	"Synthesizing cross-referenced report",
];

/// The whole research flow, driven by [`AppState`].
#[component]
pub fn Home() -> impl IntoView {
	let client = expect_context::<GeminiClient>();
	let state = RwSignal::new(AppState::default());
	let screen = Memo::new(move |_| state.with(|s| s.view()));
	let dispatch = move |event: AppEvent| {
		state.update(|s| {
			s.apply(event);
		})
	};

	let on_submit = Callback::new(move |params: ResearchParams| {
		let mut request = None;
		state.update(|s| {
			if s.apply(AppEvent::Submit(params.query.clone())) {
				request = Some(s.request());
			}
		});
		let Some(request) = request else {
			return;
		};
		info!("research request {request}: {}", params.query);
		let client = client.clone();
		spawn_local(async move {
			let event = match client.generate_report(&params).await {
				Ok(report) => AppEvent::ReportReady { request, report },
				Err(e) => {
					warn!("research request {request} failed: {e}");
					AppEvent::ReportFailed {
						request,
						message: format!("Failed to generate report. {e}"),
					}
				}
			};
			dispatch(event);
		});
	});
	let on_back = Callback::new(move |_| dispatch(AppEvent::Back));

	view! {
		<main class="research-app">
			{move || match screen.get() {
				AppView::Intro => view! {
					<section class="intro">
						<h1>"Research Assistant"</h1>
						<p>
							"Describe a research question and get a cited literature review, a testable \
							 hypothesis, and the tools to dig into both."
						</p>
						<button on:click=move |_| dispatch(AppEvent::Enter)>"Start researching"</button>
					</section>
				}
				.into_any(),
				AppView::Input => view! {
					<section class="input">
						{move || {
							state
								.with(|s| s.error().map(str::to_owned))
								.map(|msg| {
									view! {
										<div class="error-banner" role="alert">
											<span>{msg}</span>
											<button on:click=move |_| dispatch(AppEvent::DismissError)>"✕"</button>
										</div>
									}
								})
						}}
						<ResearchForm on_submit=on_submit />
					</section>
				}
				.into_any(),
				AppView::Processing => view! {
					<section class="processing">
						<div class="spinner"></div>
						<h2>"Generating Research Report"</h2>
						<p class="query">{move || state.with(|s| format!("\"{}\"", s.query()))}</p>
						<ul class="stages">{STAGES.into_iter().map(|s| view! { <li>{s}</li> }).collect_view()}</ul>
					</section>
				}
				.into_any(),
				AppView::Results => state
					.with_untracked(|s| s.report().cloned())
					.map(|report| view! { <ReportView report=report on_back=on_back /> })
					.into_any(),
			}}
		</main>
	}
}
