//! Input form for a new research request.

use leptos::prelude::*;

use crate::research::{ResearchParams, SourceFilter};

const TIMEFRAMES: [&str; 4] = ["Last 2 years", "Last 5 years", "Last 10 years", "All time"];

/// Query form. Calls `on_submit` with the filled-in parameters; blank
/// queries are not submitted.
#[component]
pub fn ResearchForm(
	/// Receives the trimmed query and the chosen filters.
	on_submit: Callback<ResearchParams>,
) -> impl IntoView {
	let query = RwSignal::new(String::new());
	let timeframe = RwSignal::new(TIMEFRAMES[1].to_string());
	let exclusions = RwSignal::new(String::new());
	let defaults = SourceFilter::default();
	let patents = RwSignal::new(defaults.patents);
	let journals = RwSignal::new(defaults.journals);
	let preprints = RwSignal::new(defaults.preprints);

	let submit = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		let text = query.get_untracked();
		if text.trim().is_empty() {
			return;
		}
		on_submit.run(ResearchParams {
			query: text.trim().to_string(),
			timeframe: timeframe.get_untracked(),
			sources: SourceFilter {
				patents: patents.get_untracked(),
				journals: journals.get_untracked(),
				preprints: preprints.get_untracked(),
			},
			exclusions: exclusions.get_untracked(),
		});
	};

	let source_toggle = |label: &'static str, signal: RwSignal<bool>| {
		view! {
			<label class="source-toggle">
				<input
					type="checkbox"
					prop:checked=move || signal.get()
					on:change=move |ev| signal.set(event_target_checked(&ev))
				/>
				{label}
			</label>
		}
	};

	view! {
		<form class="research-form" on:submit=submit>
			<label for="query">"Research query"</label>
			<textarea
				id="query"
				rows="4"
				placeholder="e.g. Room-temperature sodium-ion solid electrolytes"
				prop:value=move || query.get()
				on:input=move |ev| query.set(event_target_value(&ev))
			></textarea>

			<label for="timeframe">"Timeframe"</label>
			<select id="timeframe" on:change=move |ev| timeframe.set(event_target_value(&ev))>
				{TIMEFRAMES
					.into_iter()
					.map(|t| view! { <option value=t selected=move || timeframe.get() == t>{t}</option> })
					.collect_view()}
			</select>

			<fieldset class="sources">
				<legend>"Sources"</legend>
				{source_toggle("Patents", patents)}
				{source_toggle("Journals", journals)}
				{source_toggle("Preprints", preprints)}
			</fieldset>

			<label for="exclusions">"Exclusions"</label>
			<input
				id="exclusions"
				type="text"
				placeholder="Topics or sources to leave out"
				prop:value=move || exclusions.get()
				on:input=move |ev| exclusions.set(event_target_value(&ev))
			/>

			<button type="submit" disabled=move || query.with(|q| q.trim().is_empty())>
				"Generate report"
			</button>
		</form>
	}
}
