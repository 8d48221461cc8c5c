//! Boundary to the hosted generative model that writes reports, plans,
//! comparisons and knowledge graphs.

use std::fmt;

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::report::{
	ChatMessage, Citation, ExperimentalPlan, PaperComparison, ResearchParams, ResearchReport,
};
use crate::graph::KnowledgeGraph;

/// Reply used when the chat assistant cannot be reached.
pub const CHAT_UNAVAILABLE: &str = "Error communicating with the research assistant.";
/// Reply used when the chat is asked a question without a configured key.
pub const CHAT_MISSING_KEY: &str = "API key missing. Please configure RESEARCH_API_KEY.";
/// Reply used when the model answers with nothing.
pub const CHAT_EMPTY: &str = "I could not generate a response.";

/// Connection settings for the generative model. Built once and handed to
/// whoever makes the calls.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceConfig {
	/// Credential sent with every request.
	pub api_key: Option<String>,
	/// Model identifier.
	pub model: String,
	/// Base URL of the REST API.
	pub endpoint: String,
	/// Sampling temperature for report generation.
	pub temperature: f32,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			api_key: None,
			model: "gemini-2.5-flash".into(),
			endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
			temperature: 0.3,
		}
	}
}

impl ServiceConfig {
	/// Settings with the key baked in at build time from `RESEARCH_API_KEY`.
	pub fn from_build_env() -> Self {
		let config = Self::default().with_api_key(option_env!("RESEARCH_API_KEY"));
		if config.ensure_api_key().is_err() {
			warn!("RESEARCH_API_KEY was not set at build time; model calls will fail until it is");
		}
		config
	}

	/// Replace the key. Blank keys count as missing.
	pub fn with_api_key<S: AsRef<str>>(mut self, key: Option<S>) -> Self {
		self.api_key = key
			.map(|k| k.as_ref().trim().to_owned())
			.filter(|k| !k.is_empty());
		self
	}

	/// The key, or [`ServiceError::MissingApiKey`].
	pub fn ensure_api_key(&self) -> Result<&str, ServiceError> {
		self.api_key.as_deref().ok_or(ServiceError::MissingApiKey)
	}

	/// URL of the `generateContent` method for the configured model.
	pub fn generate_url(&self) -> String {
		format!(
			"{}/models/{}:generateContent",
			self.endpoint.trim_end_matches('/'),
			self.model
		)
	}
}

/// Why a model call produced no usable result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceError {
	/// No credential configured.
	MissingApiKey,
	/// The request did not complete or came back with an error status.
	Network(String),
	/// The model answered with no text.
	EmptyResponse,
	/// The text did not match the expected shape.
	Malformed(String),
}

impl fmt::Display for ServiceError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingApiKey => {
				write!(f, "Missing API key (RESEARCH_API_KEY). Set it before building.")
			}
			Self::Network(msg) => write!(f, "Request failed: {msg}"),
			Self::EmptyResponse => write!(f, "No response from the model"),
			Self::Malformed(msg) => write!(f, "Unexpected response format: {msg}"),
		}
	}
}

impl std::error::Error for ServiceError {}

/// Everything the UI asks of the model. Each call is a single attempt; a
/// failure surfaces to the caller, who may let the user try again.
#[allow(async_fn_in_trait)]
pub trait ResearchService {
	/// Write a literature review for `params`.
	async fn generate_report(&self, params: &ResearchParams) -> Result<ResearchReport, ServiceError>;

	/// Turn a hypothesis into a lab protocol.
	async fn generate_experimental_plan(
		&self,
		hypothesis: &str,
		context: &str,
	) -> Result<ExperimentalPlan, ServiceError>;

	/// Answer `query` about `report`. Never fails; problems come back as a
	/// short apology.
	async fn query_report_context(&self, query: &str, report: &ResearchReport, history: &[ChatMessage]) -> String;

	/// Build a comparison matrix for `citations`.
	async fn generate_paper_comparison(
		&self,
		citations: &[Citation],
		context: &str,
	) -> Result<PaperComparison, ServiceError>;

	/// Extract entities and relations from `context`.
	async fn generate_knowledge_graph(&self, context: &str) -> Result<KnowledgeGraph, ServiceError>;
}

/// System instruction plus user turn for one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
	/// Role and rules for the model.
	pub system: String,
	/// The request itself.
	pub user: String,
}

/// Prompt for [`ResearchService::generate_report`].
pub fn report_prompt(params: &ResearchParams) -> Prompt {
	let sources = serde_json::to_string(&params.sources).unwrap_or_default();
	Prompt {
		system: "You are an expert materials science research assistant producing a high-level \
			literature review for the user's query.\n\
			Constraints:\n\
			1. Tone: professional, academic, concise.\n\
			2. Format: JSON.\n\
			3. Content: chemical compositions, mechanical properties, synthesis methods and performance metrics.\n\
			4. Citations: include 4-8 specific, realistic papers.\n\
			5. Every [x] marker in the text must match an id in the citations array."
			.into(),
		user: format!(
			"Research Topic: {}\nTimeframe Constraints: {}\nSource Types: {}\nExclusions: {}\n\n\
			Generate a literature review with:\n\
			- 3 distinct sections (e.g. Current State, Methodologies, Performance).\n\
			- A 'Novel Hypothesis' identifying a gap.\n\
			- A list of citations.",
			params.query, params.timeframe, sources, params.exclusions
		),
	}
}

/// Prompt for [`ResearchService::generate_experimental_plan`].
pub fn plan_prompt(hypothesis: &str, context: &str) -> Prompt {
	Prompt {
		system: "You are a lab director. Convert hypotheses into actionable, step-by-step \
			experimental recipes with clear conditions (temperature, pressure, duration) and safety warnings."
			.into(),
		user: format!(
			"Based on this hypothesis: \"{hypothesis}\" and the following context: {context}, \
			generate a concrete laboratory experimental protocol."
		),
	}
}

/// System instruction for [`ResearchService::query_report_context`].
pub fn chat_instruction(report: &ResearchReport) -> String {
	format!(
		"You are a research assistant answering questions about the generated report below.\n\
		Context: {}\n\n\
		Rules:\n\
		1. Answer primarily from the provided context.\n\
		2. If asked for clarification, explain the scientific concepts.\n\
		3. Keep answers concise and useful to a PhD researcher.",
		report.chat_context()
	)
}

/// Prompt for [`ResearchService::generate_paper_comparison`].
pub fn comparison_prompt(citations: &[Citation], context: &str) -> Prompt {
	let papers = citations
		.iter()
		.map(|c| format!("ID: {}, Title: {}, Authors: {}", c.id, c.title, c.authors))
		.collect::<Vec<_>>()
		.join("\n");
	Prompt {
		system: "You are a senior researcher comparing multiple papers in the context of a literature review. \
			Build a comparison matrix covering methodologies, key findings, pros, cons and material properties. \
			Take values from the context; where they are missing, infer from standard knowledge of the papers \
			or state 'Not Specified'."
			.into(),
		user: format!(
			"Context from Report: {context}\n\nPapers to Compare:\n{papers}\n\nGenerate a JSON comparison matrix."
		),
	}
}

/// Prompt for [`ResearchService::generate_knowledge_graph`].
pub fn graph_prompt(context: &str) -> Prompt {
	Prompt {
		system: "You are a data scientist visualizing scientific concepts. Extract key entities and \
			relationships from the text to build a knowledge graph.\n\
			Nodes: key materials, properties, synthesis methods and applications; labels of 1-3 words; \
			at most 10-20 of the most important.\n\
			Edges: connect related nodes with a short verb (e.g. 'enhances', 'reduces', 'uses')."
			.into(),
		user: format!("Analyze this text and extract a knowledge graph:\n{context}"),
	}
}

/// Response schema constraining report output.
pub fn report_schema() -> Value {
	json!({
		"type": "OBJECT",
		"properties": {
			"title": { "type": "STRING" },
			"summary": { "type": "STRING" },
			"sections": {
				"type": "ARRAY",
				"items": {
					"type": "OBJECT",
					"properties": {
						"heading": { "type": "STRING" },
						"content": { "type": "STRING" }
					},
					"required": ["heading", "content"]
				}
			},
			"novel_hypothesis": { "type": "STRING" },
			"citations": {
				"type": "ARRAY",
				"items": {
					"type": "OBJECT",
					"properties": {
						"id": { "type": "INTEGER" },
						"title": { "type": "STRING" },
						"authors": { "type": "STRING" },
						"journal": { "type": "STRING" },
						"year": { "type": "STRING" }
					},
					"required": ["id", "title", "authors", "journal", "year"]
				}
			}
		},
		"required": ["title", "summary", "sections", "novel_hypothesis", "citations"]
	})
}

/// Response schema constraining protocol output.
pub fn plan_schema() -> Value {
	json!({
		"type": "OBJECT",
		"properties": {
			"title": { "type": "STRING" },
			"objective": { "type": "STRING" },
			"steps": {
				"type": "ARRAY",
				"items": {
					"type": "OBJECT",
					"properties": {
						"step_number": { "type": "INTEGER" },
						"action": { "type": "STRING" },
						"conditions": { "type": "STRING" },
						"equipment": { "type": "STRING" }
					},
					"required": ["step_number", "action", "conditions", "equipment"]
				}
			},
			"safety_warnings": { "type": "ARRAY", "items": { "type": "STRING" } }
		},
		"required": ["title", "objective", "steps", "safety_warnings"]
	})
}

/// Response schema constraining comparison output.
pub fn comparison_schema() -> Value {
	json!({
		"type": "OBJECT",
		"properties": {
			"summary": { "type": "STRING" },
			"points": {
				"type": "ARRAY",
				"items": {
					"type": "OBJECT",
					"properties": {
						"attribute": { "type": "STRING" },
						"details": {
							"type": "ARRAY",
							"items": {
								"type": "OBJECT",
								"properties": {
									"citation_id": { "type": "INTEGER" },
									"value": { "type": "STRING" }
								},
								"required": ["citation_id", "value"]
							}
						}
					},
					"required": ["attribute", "details"]
				}
			}
		},
		"required": ["summary", "points"]
	})
}

/// Response schema constraining graph extraction output.
pub fn graph_schema() -> Value {
	json!({
		"type": "OBJECT",
		"properties": {
			"nodes": {
				"type": "ARRAY",
				"items": {
					"type": "OBJECT",
					"properties": {
						"id": { "type": "STRING" },
						"label": { "type": "STRING" },
						"type": {
							"type": "STRING",
							"enum": ["material", "property", "method", "application"]
						}
					},
					"required": ["id", "label", "type"]
				}
			},
			"edges": {
				"type": "ARRAY",
				"items": {
					"type": "OBJECT",
					"properties": {
						"source": { "type": "STRING" },
						"target": { "type": "STRING" },
						"relationship": { "type": "STRING" }
					},
					"required": ["source", "target", "relationship"]
				}
			}
		},
		"required": ["nodes", "edges"]
	})
}

/// Decode the model's JSON answer into `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, ServiceError> {
	if text.trim().is_empty() {
		return Err(ServiceError::EmptyResponse);
	}
	serde_json::from_str(text).map_err(|e| ServiceError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::research::report::{Section, SourceFilter};

	fn params() -> ResearchParams {
		ResearchParams {
			query: "perovskite stability".into(),
			timeframe: "Last 5 years".into(),
			sources: SourceFilter {
				patents: false,
				journals: true,
				preprints: true,
			},
			exclusions: "reviews".into(),
		}
	}

	#[test]
	fn default_config_has_no_key() {
		let config = ServiceConfig::default();
		assert_eq!(config.ensure_api_key(), Err(ServiceError::MissingApiKey));
		assert_eq!(config.model, "gemini-2.5-flash");
	}

	#[test]
	fn blank_keys_count_as_missing() {
		let config = ServiceConfig::default().with_api_key(Some("   "));
		assert!(config.api_key.is_none());
		let config = config.with_api_key(Some(" abc "));
		assert_eq!(config.ensure_api_key(), Ok("abc"));
	}

	#[test]
	fn generate_url_joins_model() {
		let config = ServiceConfig {
			endpoint: "https://example.test/v1/".into(),
			model: "m".into(),
			..ServiceConfig::default()
		};
		assert_eq!(config.generate_url(), "https://example.test/v1/models/m:generateContent");
	}

	#[test]
	fn report_prompt_embeds_params() {
		let prompt = report_prompt(&params());
		assert!(prompt.user.contains("Research Topic: perovskite stability"));
		assert!(prompt.user.contains(r#"{"patents":false,"journals":true,"preprints":true}"#));
		assert!(prompt.user.contains("Exclusions: reviews"));
	}

	#[test]
	fn comparison_prompt_lists_papers() {
		let citations = [Citation {
			id: 4,
			title: "T".into(),
			authors: "A".into(),
			journal: "J".into(),
			year: "2020".into(),
			doi: None,
		}];
		let prompt = comparison_prompt(&citations, "ctx");
		assert!(prompt.user.contains("ID: 4, Title: T, Authors: A"));
		assert!(prompt.user.starts_with("Context from Report: ctx"));
	}

	#[test]
	fn chat_instruction_grounds_in_report() {
		let report = ResearchReport {
			title: "T".into(),
			summary: "S".into(),
			sections: vec![Section {
				heading: "H".into(),
				content: "C".into(),
			}],
			novel_hypothesis: "N".into(),
			citations: vec![],
		};
		assert!(chat_instruction(&report).contains("Sections: H: C"));
	}

	#[test]
	fn graph_schema_restricts_node_types() {
		let schema = graph_schema();
		let kinds = &schema["properties"]["nodes"]["items"]["properties"]["type"]["enum"];
		assert_eq!(kinds.as_array().map(Vec::len), Some(4));
	}

	#[test]
	fn parse_structured_reports_shape_errors() {
		assert_eq!(parse_structured::<KnowledgeGraph>("  "), Err(ServiceError::EmptyResponse));
		assert!(matches!(
			parse_structured::<KnowledgeGraph>("{\"nodes\": 3}"),
			Err(ServiceError::Malformed(_))
		));
		let graph: KnowledgeGraph = parse_structured(r#"{"nodes": [], "edges": []}"#).unwrap();
		assert_eq!(graph.node_count(), 0);
	}
}
