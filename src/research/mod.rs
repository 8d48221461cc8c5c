//! Report model and the hosted-model calls that produce it.

mod gemini;
pub mod report;
pub mod service;

pub use gemini::GeminiClient;
pub use report::{
	ChatMessage, ChatRole, Citation, CitationSelection, ExperimentalPlan, PaperComparison, ResearchParams,
	ResearchReport, Section, SourceFilter, TextSegment,
};
pub use service::{ResearchService, ServiceConfig, ServiceError};
