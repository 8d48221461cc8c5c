//! [`ResearchService`] over the Gemini REST API using the browser's `fetch`.

use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::report::{
	ChatMessage, ChatRole, Citation, ExperimentalPlan, PaperComparison, ResearchParams, ResearchReport,
};
use super::service::{
	CHAT_EMPTY, CHAT_MISSING_KEY, CHAT_UNAVAILABLE, Prompt, ResearchService, ServiceConfig, ServiceError,
	chat_instruction, comparison_prompt, comparison_schema, graph_prompt, graph_schema, parse_structured,
	plan_prompt, plan_schema, report_prompt, report_schema,
};
use crate::graph::KnowledgeGraph;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct Part {
	text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct Content {
	#[serde(skip_serializing_if = "Option::is_none")]
	role: Option<String>,
	#[serde(default)]
	parts: Vec<Part>,
}

impl Content {
	fn text(role: Option<&str>, text: &str) -> Self {
		Self {
			role: role.map(str::to_owned),
			parts: vec![Part { text: text.to_owned() }],
		}
	}
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
	#[serde(skip_serializing_if = "Option::is_none")]
	response_mime_type: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	response_schema: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	temperature: Option<f32>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
	contents: Vec<Content>,
	system_instruction: Content,
	generation_config: GenerationConfig,
}

impl GenerateRequest {
	/// Single-turn request whose answer must match `schema`.
	fn structured(prompt: Prompt, schema: Value, temperature: Option<f32>) -> Self {
		Self {
			contents: vec![Content::text(Some("user"), &prompt.user)],
			system_instruction: Content::text(None, &prompt.system),
			generation_config: GenerationConfig {
				response_mime_type: Some("application/json"),
				response_schema: Some(schema),
				temperature,
			},
		}
	}

	/// Multi-turn free-text chat.
	fn chat(system: String, history: &[ChatMessage], query: &str) -> Self {
		let mut contents: Vec<Content> = history
			.iter()
			.map(|m| {
				let role = match m.role {
					ChatRole::User => "user",
					ChatRole::Model => "model",
				};
				Content::text(Some(role), &m.content)
			})
			.collect();
		contents.push(Content::text(Some("user"), query));
		Self {
			contents,
			system_instruction: Content::text(None, &system),
			generation_config: GenerationConfig {
				response_mime_type: None,
				response_schema: None,
				temperature: None,
			},
		}
	}
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
	#[serde(default)]
	candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
	content: Option<Content>,
}

/// Concatenated text parts of the first candidate in a `generateContent`
/// response body.
fn candidate_text(body: &str) -> Result<String, ServiceError> {
	let response: GenerateResponse =
		serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
	let text: String = response
		.candidates
		.into_iter()
		.next()
		.and_then(|c| c.content)
		.map(|c| c.parts.into_iter().map(|p| p.text).collect())
		.unwrap_or_default();
	if text.trim().is_empty() {
		return Err(ServiceError::EmptyResponse);
	}
	Ok(text)
}

fn js_error(err: JsValue) -> ServiceError {
	ServiceError::Network(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Client for the hosted model. Cheap to clone.
#[derive(Clone, Debug)]
pub struct GeminiClient {
	config: ServiceConfig,
}

impl GeminiClient {
	/// Client using `config`.
	pub fn new(config: ServiceConfig) -> Self {
		Self { config }
	}

	/// Settings in use.
	pub fn config(&self) -> &ServiceConfig {
		&self.config
	}

	async fn post(&self, request: &GenerateRequest) -> Result<String, ServiceError> {
		let key = self.config.ensure_api_key()?;
		let payload = serde_json::to_string(request).map_err(|e| ServiceError::Malformed(e.to_string()))?;

		let init = RequestInit::new();
		init.set_method("POST");
		init.set_body(&JsValue::from_str(&payload));
		let req = Request::new_with_str_and_init(&self.config.generate_url(), &init).map_err(js_error)?;
		req.headers().set("Content-Type", "application/json").map_err(js_error)?;
		req.headers().set("x-goog-api-key", key).map_err(js_error)?;

		let window = web_sys::window().ok_or_else(|| ServiceError::Network("no window".into()))?;
		let response: Response = JsFuture::from(window.fetch_with_request(&req))
			.await
			.map_err(js_error)?
			.dyn_into()
			.map_err(js_error)?;
		let body = JsFuture::from(response.text().map_err(js_error)?)
			.await
			.map_err(js_error)?
			.as_string()
			.unwrap_or_default();
		debug!("{} -> HTTP {}", self.config.model, response.status());

		if !response.ok() {
			return Err(ServiceError::Network(format!("HTTP {}: {}", response.status(), body)));
		}
		candidate_text(&body)
	}

	async fn structured<T: serde::de::DeserializeOwned>(
		&self,
		what: &str,
		request: GenerateRequest,
	) -> Result<T, ServiceError> {
		let result = match self.post(&request).await {
			Ok(text) => parse_structured(&text),
			Err(e) => Err(e),
		};
		if let Err(e) = &result {
			error!("{what} generation failed: {e}");
		}
		result
	}
}

impl ResearchService for GeminiClient {
	async fn generate_report(&self, params: &ResearchParams) -> Result<ResearchReport, ServiceError> {
		let request = GenerateRequest::structured(report_prompt(params), report_schema(), Some(self.config.temperature));
		self.structured("report", request).await
	}

	async fn generate_experimental_plan(
		&self,
		hypothesis: &str,
		context: &str,
	) -> Result<ExperimentalPlan, ServiceError> {
		let request = GenerateRequest::structured(plan_prompt(hypothesis, context), plan_schema(), None);
		self.structured("experiment", request).await
	}

	async fn query_report_context(&self, query: &str, report: &ResearchReport, history: &[ChatMessage]) -> String {
		if self.config.ensure_api_key().is_err() {
			return CHAT_MISSING_KEY.into();
		}
		let request = GenerateRequest::chat(chat_instruction(report), history, query);
		match self.post(&request).await {
			Ok(text) => text,
			Err(ServiceError::EmptyResponse) => CHAT_EMPTY.into(),
			Err(e) => {
				error!("chat failed: {e}");
				CHAT_UNAVAILABLE.into()
			}
		}
	}

	async fn generate_paper_comparison(
		&self,
		citations: &[Citation],
		context: &str,
	) -> Result<PaperComparison, ServiceError> {
		let request = GenerateRequest::structured(comparison_prompt(citations, context), comparison_schema(), None);
		self.structured("comparison", request).await
	}

	async fn generate_knowledge_graph(&self, context: &str) -> Result<KnowledgeGraph, ServiceError> {
		let request = GenerateRequest::structured(graph_prompt(context), graph_schema(), None);
		self.structured("graph", request).await
	}
}
