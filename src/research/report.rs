//! Report model returned by the research service, plus the text shaping the
//! results view needs: citation-marker splitting, tool context strings,
//! comparison selection and BibTeX export.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which publication kinds the search may draw on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFilter {
	/// Include patents.
	pub patents: bool,
	/// Include peer-reviewed journals.
	pub journals: bool,
	/// Include preprints.
	pub preprints: bool,
}

impl Default for SourceFilter {
	fn default() -> Self {
		Self {
			patents: true,
			journals: true,
			preprints: false,
		}
	}
}

/// What the user asked for on the input form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchParams {
	/// Free-text research question.
	pub query: String,
	/// e.g. "Last 5 years".
	pub timeframe: String,
	/// Allowed source kinds.
	pub sources: SourceFilter,
	/// Topics or sources to leave out.
	pub exclusions: String,
}

/// An entry in the reference list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
	/// Number used by `[n]` markers in section text.
	pub id: u32,
	/// Paper title.
	pub title: String,
	/// Author list as one string.
	pub authors: String,
	/// Venue.
	pub journal: String,
	/// Publication year.
	pub year: String,
	/// DOI, when known.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub doi: Option<String>,
}

/// One headed block of the review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
	/// Section heading.
	pub heading: String,
	/// Body text with `[n]` citation markers.
	pub content: String,
}

/// A generated literature review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchReport {
	/// Formal title.
	pub title: String,
	/// Two or three sentence executive summary.
	pub summary: String,
	/// Body sections.
	pub sections: Vec<Section>,
	/// Testable hypothesis identifying a gap.
	pub novel_hypothesis: String,
	/// Reference list.
	pub citations: Vec<Citation>,
}

impl ResearchReport {
	/// Section bodies joined by newlines; the context handed to the plan,
	/// comparison and graph tools.
	pub fn section_context(&self) -> String {
		self.sections
			.iter()
			.map(|s| s.content.as_str())
			.collect::<Vec<_>>()
			.join("\n")
	}

	/// Condensed report used to ground the chat assistant.
	pub fn chat_context(&self) -> String {
		let sections = self
			.sections
			.iter()
			.map(|s| format!("{}: {}", s.heading, s.content))
			.collect::<Vec<_>>()
			.join("\n");
		format!(
			"Title: {}\nSummary: {}\nNovel Hypothesis: {}\nSections: {}",
			self.title, self.summary, self.novel_hypothesis, sections
		)
	}

	/// Reference with the given marker number.
	pub fn citation(&self, id: u32) -> Option<&Citation> {
		self.citations.iter().find(|c| c.id == id)
	}

	/// References whose ids are in `ids`, in reference-list order.
	pub fn citations_for(&self, ids: &[u32]) -> Vec<Citation> {
		self.citations
			.iter()
			.filter(|c| ids.contains(&c.id))
			.cloned()
			.collect()
	}
}

/// A run of section text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextSegment {
	/// Plain prose.
	Text(String),
	/// A `[n]` marker. Wider than [`Citation::id`]; longer digit runs
	/// saturate, so any run of digits still reads as a marker.
	Citation(u64),
}

/// Split `text` into prose and `[n]` citation markers. Brackets that do not
/// enclose only digits stay in the prose.
pub fn split_citations(text: &str) -> Vec<TextSegment> {
	let mut segments = Vec::new();
	let mut plain_start = 0;
	let mut cursor = 0;

	while let Some(open) = text[cursor..].find('[').map(|i| cursor + i) {
		let digits = text[open + 1..]
			.find(|c: char| !c.is_ascii_digit())
			.map(|len| &text[open + 1..open + 1 + len]);
		let marker = digits.filter(|d| !d.is_empty() && text[open + 1 + d.len()..].starts_with(']'));

		match marker.map(|d| (d.parse::<u64>().unwrap_or(u64::MAX), d.len())) {
			Some((id, len)) => {
				if open > plain_start {
					segments.push(TextSegment::Text(text[plain_start..open].to_owned()));
				}
				segments.push(TextSegment::Citation(id));
				cursor = open + len + 2;
				plain_start = cursor;
			}
			None => cursor = open + 1,
		}
	}
	if plain_start < text.len() {
		segments.push(TextSegment::Text(text[plain_start..].to_owned()));
	}
	segments
}

/// Most papers compared at once.
pub const MAX_COMPARED: usize = 3;

/// Returned when a fourth paper is picked for comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionFull;

impl fmt::Display for SelectionFull {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "You can compare up to {MAX_COMPARED} papers at a time.")
	}
}

impl std::error::Error for SelectionFull {}

/// Citations ticked for side-by-side comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CitationSelection {
	selected: Vec<u32>,
}

impl CitationSelection {
	/// Select `id`, or deselect it if already selected. Returns whether it
	/// is selected afterwards.
	pub fn toggle(&mut self, id: u32) -> Result<bool, SelectionFull> {
		if let Some(pos) = self.selected.iter().position(|&s| s == id) {
			self.selected.remove(pos);
			return Ok(false);
		}
		if self.selected.len() >= MAX_COMPARED {
			return Err(SelectionFull);
		}
		self.selected.push(id);
		Ok(true)
	}

	/// Whether `id` is ticked.
	pub fn contains(&self, id: u32) -> bool {
		self.selected.contains(&id)
	}

	/// Ticked ids in selection order.
	pub fn selected(&self) -> &[u32] {
		&self.selected
	}

	/// A comparison needs at least two papers.
	pub fn can_compare(&self) -> bool {
		self.selected.len() >= 2
	}
}

/// BibTeX `@article` entries for `citations`, separated by blank lines.
pub fn to_bibtex(citations: &[Citation]) -> String {
	citations
		.iter()
		.map(|c| {
			format!(
				"@article{{{},\n  title={{{}}},\n  author={{{}}},\n  journal={{{}}},\n  year={{{}}}\n}}",
				bibtex_key(c),
				c.title,
				c.authors,
				c.journal,
				c.year
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}

fn bibtex_key(citation: &Citation) -> String {
	let surname: String = citation
		.authors
		.split(' ')
		.next()
		.unwrap_or_default()
		.chars()
		.filter(char::is_ascii_alphabetic)
		.collect();
	format!("{surname}{}", citation.year)
}

/// Who wrote a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	/// The person using the app.
	User,
	/// The assistant.
	Model,
}

/// One turn of the report chat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	/// Author.
	pub role: ChatRole,
	/// Message text.
	pub content: String,
}

impl ChatMessage {
	/// A message typed by the user.
	pub fn user(content: impl Into<String>) -> Self {
		Self {
			role: ChatRole::User,
			content: content.into(),
		}
	}

	/// A reply from the assistant.
	pub fn model(content: impl Into<String>) -> Self {
		Self {
			role: ChatRole::Model,
			content: content.into(),
		}
	}
}

/// One step of a lab protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentalStep {
	/// 1-based position.
	pub step_number: u32,
	/// What to do.
	pub action: String,
	/// e.g. "500C for 2 hours".
	pub conditions: String,
	/// Required apparatus.
	pub equipment: String,
}

/// A protocol derived from the report's hypothesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentalPlan {
	/// Protocol title.
	pub title: String,
	/// What the experiment sets out to show.
	pub objective: String,
	/// Ordered steps.
	pub steps: Vec<ExperimentalStep>,
	/// Hazards to observe.
	pub safety_warnings: Vec<String>,
}

/// One paper's value for a compared attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonDetail {
	/// Which reference this value belongs to.
	pub citation_id: u32,
	/// The finding for that paper.
	pub value: String,
}

/// A row of the comparison matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPoint {
	/// e.g. "Synthesis Method".
	pub attribute: String,
	/// One entry per compared paper.
	pub details: Vec<ComparisonDetail>,
}

impl ComparisonPoint {
	/// Value recorded for `citation_id`, if any.
	pub fn value_for(&self, citation_id: u32) -> Option<&str> {
		self.details
			.iter()
			.find(|d| d.citation_id == citation_id)
			.map(|d| d.value.as_str())
	}
}

/// Side-by-side comparison of selected papers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperComparison {
	/// Short synthesis of the key differences.
	pub summary: String,
	/// Matrix rows.
	pub points: Vec<ComparisonPoint>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn citation(id: u32, authors: &str, year: &str) -> Citation {
		Citation {
			id,
			title: format!("Paper {id}"),
			authors: authors.into(),
			journal: "Acta Materialia".into(),
			year: year.into(),
			doi: None,
		}
	}

	fn report() -> ResearchReport {
		ResearchReport {
			title: "Solid-state electrolytes".into(),
			summary: "Short summary.".into(),
			sections: vec![
				Section {
					heading: "Current State".into(),
					content: "Garnets dominate [1].".into(),
				},
				Section {
					heading: "Methods".into(),
					content: "Sintering [2][3] is common.".into(),
				},
			],
			novel_hypothesis: "Dopants lower grain resistance.".into(),
			citations: vec![citation(1, "Li X.", "2021"), citation(2, "Wang Y.", "2022"), citation(3, "Kim J.", "2023")],
		}
	}

	#[test]
	fn splits_markers_out_of_prose() {
		assert_eq!(
			split_citations("Sintering [2][3] is common."),
			vec![
				TextSegment::Text("Sintering ".into()),
				TextSegment::Citation(2),
				TextSegment::Citation(3),
				TextSegment::Text(" is common.".into()),
			]
		);
	}

	#[test]
	fn leaves_non_numeric_brackets_alone() {
		assert_eq!(
			split_citations("see [a] and [12x] or [] [4"),
			vec![TextSegment::Text("see [a] and [12x] or [] [4".into())]
		);
	}

	#[test]
	fn marker_only_text() {
		assert_eq!(split_citations("[7]"), vec![TextSegment::Citation(7)]);
		assert_eq!(
			split_citations("[99999999999]"),
			vec![TextSegment::Citation(99_999_999_999)]
		);
		assert_eq!(
			split_citations("x [123456789012345678901234] y"),
			vec![
				TextSegment::Text("x ".into()),
				TextSegment::Citation(u64::MAX),
				TextSegment::Text(" y".into()),
			]
		);
		assert!(split_citations("").is_empty());
	}

	#[test]
	fn section_context_joins_bodies() {
		assert_eq!(report().section_context(), "Garnets dominate [1].\nSintering [2][3] is common.");
	}

	#[test]
	fn chat_context_carries_headings() {
		let ctx = report().chat_context();
		assert!(ctx.starts_with("Title: Solid-state electrolytes\n"));
		assert!(ctx.contains("Novel Hypothesis: Dopants lower grain resistance."));
		assert!(ctx.contains("Methods: Sintering"));
	}

	#[test]
	fn selection_caps_at_three() {
		let mut sel = CitationSelection::default();
		assert_eq!(sel.toggle(1), Ok(true));
		assert!(!sel.can_compare());
		assert_eq!(sel.toggle(2), Ok(true));
		assert!(sel.can_compare());
		assert_eq!(sel.toggle(3), Ok(true));
		assert_eq!(sel.toggle(4), Err(SelectionFull));
		assert_eq!(sel.toggle(2), Ok(false));
		assert_eq!(sel.selected(), &[1, 3]);
		assert_eq!(sel.toggle(4), Ok(true));
	}

	#[test]
	fn citations_for_keeps_reference_order() {
		let picked = report().citations_for(&[3, 1]);
		let ids: Vec<_> = picked.iter().map(|c| c.id).collect();
		assert_eq!(ids, vec![1, 3]);
	}

	#[test]
	fn bibtex_entries() {
		let bib = to_bibtex(&[citation(1, "O'Neil A., Smith B.", "2020"), citation(2, " Lee", "2019")]);
		let expected = "@article{ONeil2020,\n  title={Paper 1},\n  author={O'Neil A., Smith B.},\n  journal={Acta Materialia},\n  year={2020}\n}\n\n@article{2019,\n  title={Paper 2},\n  author={ Lee},\n  journal={Acta Materialia},\n  year={2019}\n}";
		assert_eq!(bib, expected);
	}

	#[test]
	fn parses_report_json_without_doi() {
		let json = serde_json::to_string(&report()).unwrap();
		assert!(!json.contains("doi"));
		let back: ResearchReport = serde_json::from_str(&json).unwrap();
		assert_eq!(back.citation(2).map(|c| c.authors.as_str()), Some("Wang Y."));
	}

	#[test]
	fn comparison_lookup() {
		let point = ComparisonPoint {
			attribute: "Yield".into(),
			details: vec![ComparisonDetail {
				citation_id: 2,
				value: "85%".into(),
			}],
		};
		assert_eq!(point.value_for(2), Some("85%"));
		assert_eq!(point.value_for(1), None);
	}

	#[test]
	fn chat_roles_serialize_like_the_api() {
		let json = serde_json::to_string(&ChatMessage::model("hi")).unwrap();
		assert_eq!(json, r#"{"role":"model","content":"hi"}"#);
	}
}
