use docqa_core::traits::VectorIndexer;

use crate::engine::{AnswerEngine, AnswerRecord};
use crate::prompts::AnswerMode;

/// Per-conversation state: the selected mode and the answers given so far.
///
/// The transcript is for display only; earlier turns are never fed back
/// into retrieval or prompts.
#[derive(Debug, Clone, Default)]
pub struct Session {
    mode: AnswerMode,
    transcript: Vec<AnswerRecord>,
}

impl Session {
    pub fn new(mode: AnswerMode) -> Self {
        Self { mode, transcript: Vec::new() }
    }

    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AnswerMode) {
        self.mode = mode;
    }

    pub fn ask(&mut self, engine: &AnswerEngine, index: &dyn VectorIndexer, question: &str) -> &AnswerRecord {
        let record = engine.answer(index, question, self.mode);
        self.transcript.push(record);
        &self.transcript[self.transcript.len() - 1]
    }

    pub fn transcript(&self) -> &[AnswerRecord] {
        &self.transcript
    }

    pub fn last(&self) -> Option<&AnswerRecord> {
        self.transcript.last()
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }
}
