use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use docqa_core::config::AppConfig;
use docqa_core::traits::{Embedder, VectorIndexer};
use docqa_core::types::{RetrievalResult, SourceRef};
use docqa_core::Result;

use crate::context::build_context;
use crate::generation::{GenerationRequest, Generator};
use crate::prompts::{build_prompt, AnswerMode, Prompt};

pub const NO_RELEVANT_DOCUMENT: &str = "No relevant document found.";
pub const EMPTY_QUESTION: &str = "Please enter a question.";

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSettings {
    pub top_k: usize,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl AnswerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            model: config.generation.model.clone(),
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
            timeout: Duration::from_secs(config.generation.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Generated,
    /// Retrieval found nothing; no generation call was made.
    NoRelevantContent,
    EmptyQuestion,
    RetrievalFailed { reason: String },
    GenerationFailed { reason: String },
}

/// The reply to one question, with the chunks it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub mode: AnswerMode,
    pub text: String,
    pub sources: RetrievalResult,
    pub prompt: Option<Prompt>,
    pub outcome: AnswerOutcome,
}

impl AnswerRecord {
    fn without_sources(question: &str, mode: AnswerMode, text: impl Into<String>, outcome: AnswerOutcome) -> Self {
        Self {
            question: question.to_string(),
            mode,
            text: text.into(),
            sources: RetrievalResult::default(),
            prompt: None,
            outcome,
        }
    }

    pub fn unique_sources(&self) -> Vec<SourceRef> {
        self.sources.unique_sources()
    }

    pub fn is_generated(&self) -> bool {
        self.outcome == AnswerOutcome::Generated
    }
}

/// Retrieves context for a question and asks the generator to answer from it.
///
/// The engine never mutates the index and never fails outright: every
/// problem is turned into a readable answer text.
pub struct AnswerEngine {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    settings: AnswerSettings,
}

impl AnswerEngine {
    pub fn new(embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>, settings: AnswerSettings) -> Self {
        Self { embedder, generator, settings }
    }

    pub fn settings(&self) -> &AnswerSettings {
        &self.settings
    }

    pub fn retrieve(&self, index: &dyn VectorIndexer, question: &str) -> Result<RetrievalResult> {
        let query = self.embedder.embed(question)?;
        index.search_vec(&query, self.settings.top_k)
    }

    pub fn answer(&self, index: &dyn VectorIndexer, question: &str, mode: AnswerMode) -> AnswerRecord {
        let question = question.trim();
        if question.is_empty() {
            return AnswerRecord::without_sources(question, mode, EMPTY_QUESTION, AnswerOutcome::EmptyQuestion);
        }

        let sources = match self.retrieve(index, question) {
            Ok(sources) => sources,
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                return AnswerRecord::without_sources(
                    question,
                    mode,
                    format!("Error during retrieval: {e}"),
                    AnswerOutcome::RetrievalFailed { reason: e.to_string() },
                );
            }
        };
        if sources.is_empty() {
            info!(mode = %mode, "no relevant chunks");
            return AnswerRecord::without_sources(question, mode, NO_RELEVANT_DOCUMENT, AnswerOutcome::NoRelevantContent);
        }

        let prompt = build_prompt(mode, question, &build_context(&sources));
        let request = GenerationRequest {
            model: self.settings.model.clone(),
            system: prompt.system.clone(),
            user: prompt.user.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            timeout: self.settings.timeout,
        };

        let (text, outcome) = match self.generator.generate(&request) {
            Ok(text) => {
                info!(mode = %mode, hits = sources.len(), "answer generated");
                (text, AnswerOutcome::Generated)
            }
            Err(e) => {
                warn!(mode = %mode, error = %e, "generation failed");
                (format!("Error during generation: {e}"), AnswerOutcome::GenerationFailed { reason: e.to_string() })
            }
        };

        AnswerRecord { question: question.to_string(), mode, text, sources, prompt: Some(prompt), outcome }
    }
}
