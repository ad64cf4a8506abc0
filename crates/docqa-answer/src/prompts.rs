use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docqa_core::Error;

/// Citation marker both modes require, with `<file>` and `<page>` filled in.
pub const CITATION_FORMAT: &str = "(Source: <file>, Page: <page>)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Explanatory answer to a question.
    #[default]
    Question,
    /// Formal passage ready to insert into an academic thesis.
    Redaction,
}

impl AnswerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerMode::Question => "question",
            AnswerMode::Redaction => "redaction",
        }
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "question" | "q" => Ok(AnswerMode::Question),
            "redaction" | "r" => Ok(AnswerMode::Redaction),
            other => Err(Error::InvalidConfig(format!(
                "unknown answer mode '{other}', expected 'question' or 'redaction'"
            ))),
        }
    }
}

/// The two messages sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn system_instruction(mode: AnswerMode) -> &'static str {
    match mode {
        AnswerMode::Question => {
            "You are an expert research assistant. You give developed, detailed and well-structured answers that rely strictly on the documents you are given."
        }
        AnswerMode::Redaction => {
            "You are a university researcher writing an academic thesis. Your prose is scientific, precise and ready to be inserted directly into an academic document."
        }
    }
}

pub fn build_prompt(mode: AnswerMode, question: &str, context: &str) -> Prompt {
    let user = match mode {
        AnswerMode::Question => question_prompt(question, context),
        AnswerMode::Redaction => redaction_prompt(question, context),
    };
    Prompt { system: system_instruction(mode).to_string(), user }
}

fn question_prompt(question: &str, context: &str) -> String {
    format!(
        r#"Answer the question below using the context documents.

Rules (non-negotiable):
1) Use ONLY the context below. Do not use outside knowledge or invent facts.
2) Cite every claim inline in the form {CITATION_FORMAT}.
3) If the context does not answer the question, say so plainly instead of guessing.

Instructions:
- Give a complete, developed answer of at least 3 to 4 paragraphs when the context allows it.
- Use a formal but accessible tone.
- Synthesize the relevant documents, explain the concepts, and include the examples the context provides.

Context:
{context}

Question: {question}

Answer:"#
    )
}

fn redaction_prompt(subject: &str, context: &str) -> String {
    format!(
        r#"Write a passage on the subject below that can be inserted directly into an academic thesis.

Rules (non-negotiable):
1) Use ONLY the context below. Do not use outside knowledge or invent facts.
2) Integrate citations fluidly in the form {CITATION_FORMAT}.
3) If the context is insufficient for a point, leave that point out.

Style requirements:
- Scientific, precise and objective tone with specialised vocabulary.
- 4 to 6 developed paragraphs, one main idea per paragraph, linked by logical transitions.
- Open by introducing the subject, develop an argument that synthesizes the sources, close with a synthesis.
- No first person, no greetings, no conversational phrasing.

Context:
{context}

Subject: {subject}

Academic text:"#
    )
}
