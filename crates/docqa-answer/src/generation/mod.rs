use std::time::Duration;

use thiserror::Error;

pub mod openai;

pub use openai::OpenAiChatClient;

/// Everything a generation call needs; built fresh for every question.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("the generation service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("the generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not reach the generation service: {0}")]
    Transport(String),

    #[error("could not decode the generation response: {0}")]
    Decode(String),

    #[error("the generation service returned an empty answer")]
    EmptyResponse,
}

pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
