//! Top-level view state: intro, query form, processing, results.

use log::debug;

use crate::research::ResearchReport;

/// Which screen is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppView {
	/// Landing page.
	#[default]
	Intro,
	/// Query form.
	Input,
	/// Waiting on the report.
	Processing,
	/// Report and tools.
	Results,
}

/// Something the user did, or an async call finishing.
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
	/// Leave the landing page.
	Enter,
	/// Submit the form with this query.
	Submit(String),
	/// The report for request `request` arrived.
	ReportReady {
		/// Id returned by the matching submit.
		request: u64,
		/// The report.
		report: ResearchReport,
	},
	/// The report for request `request` failed.
	ReportFailed {
		/// Id returned by the matching submit.
		request: u64,
		/// Message shown on the form.
		message: String,
	},
	/// Return from the results to the form.
	Back,
	/// Hide the error banner.
	DismissError,
}

/// The screen plus whatever it needs to render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
	view: AppView,
	query: String,
	report: Option<ResearchReport>,
	error: Option<String>,
	request: u64,
}

impl AppState {
	/// Current screen.
	pub fn view(&self) -> AppView {
		self.view
	}

	/// Query most recently submitted.
	pub fn query(&self) -> &str {
		&self.query
	}

	/// Report shown on the results screen.
	pub fn report(&self) -> Option<&ResearchReport> {
		self.report.as_ref()
	}

	/// Error from the last failed submit.
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	/// Id of the request in flight, valid while processing.
	pub fn request(&self) -> u64 {
		self.request
	}

	/// Apply `event`. Returns whether anything changed; events that make no
	/// sense for the current screen, and results of superseded requests,
	/// are dropped.
	pub fn apply(&mut self, event: AppEvent) -> bool {
		match (self.view, event) {
			(AppView::Intro, AppEvent::Enter) => {
				self.view = AppView::Input;
			}
			(AppView::Input, AppEvent::Submit(query)) => {
				self.request += 1;
				self.query = query;
				self.error = None;
				self.view = AppView::Processing;
			}
			(AppView::Processing, AppEvent::ReportReady { request, report }) if request == self.request => {
				self.report = Some(report);
				self.view = AppView::Results;
			}
			(AppView::Processing, AppEvent::ReportFailed { request, message }) if request == self.request => {
				self.error = Some(message);
				self.view = AppView::Input;
			}
			(AppView::Results, AppEvent::Back) => {
				self.report = None;
				self.view = AppView::Input;
			}
			(AppView::Input, AppEvent::DismissError) if self.error.is_some() => {
				self.error = None;
			}
			(view, event) => {
				debug!("ignoring {event:?} in {view:?}");
				return false;
			}
		}
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::research::ResearchReport;

	fn report() -> ResearchReport {
		ResearchReport {
			title: "T".into(),
			summary: "S".into(),
			sections: vec![],
			novel_hypothesis: "H".into(),
			citations: vec![],
		}
	}

	fn submitted(query: &str) -> AppState {
		let mut state = AppState::default();
		state.apply(AppEvent::Enter);
		state.apply(AppEvent::Submit(query.into()));
		state
	}

	#[test]
	fn happy_path() {
		let mut state = submitted("graphene");
		assert_eq!(state.view(), AppView::Processing);
		assert_eq!(state.query(), "graphene");
		let request = state.request();
		assert!(state.apply(AppEvent::ReportReady {
			request,
			report: report()
		}));
		assert_eq!(state.view(), AppView::Results);
		assert_eq!(state.report().map(|r| r.title.as_str()), Some("T"));

		assert!(state.apply(AppEvent::Back));
		assert_eq!(state.view(), AppView::Input);
		assert!(state.report().is_none());
	}

	#[test]
	fn failure_returns_to_form_with_error() {
		let mut state = submitted("q");
		let request = state.request();
		state.apply(AppEvent::ReportFailed {
			request,
			message: "boom".into(),
		});
		assert_eq!(state.view(), AppView::Input);
		assert_eq!(state.error(), Some("boom"));

		state.apply(AppEvent::Submit("again".into()));
		assert_eq!(state.error(), None);
		assert_eq!(state.view(), AppView::Processing);
	}

	#[test]
	fn dismiss_clears_error() {
		let mut state = submitted("q");
		let request = state.request();
		state.apply(AppEvent::ReportFailed {
			request,
			message: "boom".into(),
		});
		assert!(state.apply(AppEvent::DismissError));
		assert_eq!(state.error(), None);
		assert!(!state.apply(AppEvent::DismissError));
	}

	#[test]
	fn stale_results_are_discarded() {
		let mut state = submitted("q");
		let stale = state.request();
		state.apply(AppEvent::ReportFailed {
			request: stale,
			message: "x".into(),
		});
		state.apply(AppEvent::Submit("q2".into()));
		assert!(!state.apply(AppEvent::ReportReady {
			request: stale,
			report: report()
		}));
		assert_eq!(state.view(), AppView::Processing);
	}

	#[test]
	fn out_of_place_events_are_ignored() {
		let mut state = AppState::default();
		assert!(!state.apply(AppEvent::Submit("q".into())));
		assert!(!state.apply(AppEvent::Back));
		assert_eq!(state.view(), AppView::Intro);
		state.apply(AppEvent::Enter);
		assert!(!state.apply(AppEvent::Enter));
		assert_eq!(state.view(), AppView::Input);
	}
}
