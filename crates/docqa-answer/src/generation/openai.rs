use std::io;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationError, GenerationRequest, Generator};

const MAX_ERROR_BODY: usize = 500;

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiChatClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Generator for OpenAiChatClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(model = %request.model, prompt_chars = request.user.len(), "calling chat completions");

        let resp = self
            .agent
            .post(&self.endpoint())
            .timeout(request.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(body);

        match resp {
            Ok(r) => {
                let v: ChatResponse = r.into_json().map_err(|e| GenerationError::Decode(e.to_string()))?;
                let text = v
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default();
                if text.trim().is_empty() {
                    return Err(GenerationError::EmptyResponse);
                }
                Ok(text)
            }
            Err(ureq::Error::Status(status, r)) => {
                let mut body = r.into_string().unwrap_or_default();
                if body.len() > MAX_ERROR_BODY {
                    let cut = (0..=MAX_ERROR_BODY).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
                    body.truncate(cut);
                }
                Err(GenerationError::Status { status, body })
            }
            Err(ureq::Error::Transport(t)) if is_timeout(&t) => Err(GenerationError::Timeout(request.timeout)),
            Err(ureq::Error::Transport(t)) => Err(GenerationError::Transport(t.to_string())),
        }
    }
}

fn is_timeout(t: &ureq::Transport) -> bool {
    let io_timeout = std::error::Error::source(t)
        .and_then(|s| s.downcast_ref::<io::Error>())
        .is_some_and(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock));
    io_timeout || t.to_string().contains("timed out")
}
