pub mod context;
pub mod engine;
pub mod generation;
pub mod prompts;
pub mod session;

pub use context::build_context;
pub use engine::{AnswerEngine, AnswerOutcome, AnswerRecord, AnswerSettings, NO_RELEVANT_DOCUMENT};
pub use generation::{GenerationError, GenerationRequest, Generator, OpenAiChatClient};
pub use prompts::{build_prompt, AnswerMode, Prompt, CITATION_FORMAT};
pub use session::Session;
