use anyhow::Result as AnyResult;
use thiserror::Error;
use tracing::debug;

use finsight_index::EmbeddingIndex;
use finsight_llm::LlmResponse;

use crate::embedding::EmbeddingClient;

/// Number of nearest chunks pulled into the prompt context.
pub const TOP_K: usize = 4;

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant specialized in financial documents. \
Use the provided context to answer the question. \
If the answer is not in the document, respond with \"not found\".";

/// Replies the model uses to signal it has nothing; replaced with the
/// friendlier message below. UX policy, not an error.
const LOW_CONFIDENCE_REPLIES: [&str; 3] = ["i don't know", "i don't know.", "not found"];

pub const NO_ANSWER_MESSAGE: &str = "I couldn't find a clear answer in the document. \
Try rephrasing or asking a different question.";

/// Shown whenever a question arrives before any document has been indexed.
/// The model is never invoked without a document.
pub const NO_DOCUMENT_MESSAGE: &str = "No document has been uploaded yet. \
Upload a financial report (PDF, DOCX, XLSX or TXT) and I can answer questions \
about its revenue, profits, expenses and more.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    Concise,
    Detailed,
}

impl AnswerMode {
    pub fn instruction(&self) -> &'static str {
        match self {
            AnswerMode::Concise => "Answer concisely.",
            AnswerMode::Detailed => "Provide a detailed and in-depth answer.",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "concise" => Some(AnswerMode::Concise),
            "detailed" => Some(AnswerMode::Detailed),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("failed to embed question: {0}")]
    Embedding(String),
    #[error("model invocation failed: {0}")]
    Invocation(String),
}

#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub text: String,
    pub sources: Vec<String>,
}

/// Retrieves the top-k chunks for the question, assembles the context
/// prompt, invokes the model once, and applies the low-confidence
/// substitution. Returns the answer plus the retrieved chunk contents for
/// citation display.
pub fn answer_with_sources(
    question: &str,
    mode: AnswerMode,
    index: &EmbeddingIndex,
    embeddings: &EmbeddingClient,
    invoke: &impl Fn(Option<&str>, &str) -> AnyResult<LlmResponse>,
) -> Result<RagAnswer, AnswerError> {
    let question_vector = embeddings
        .embed(question)
        .map_err(|err| AnswerError::Embedding(err.to_string()))?;
    let hits = index.query(&question_vector, TOP_K);
    let sources: Vec<String> = hits.into_iter().map(|hit| hit.text).collect();
    debug!(retrieved = sources.len(), "assembling context prompt");
    let prompt = format!(
        "Context:\n{}\n\nQuestion:\n{}\n{}",
        sources.join("\n\n"),
        mode.instruction(),
        question.trim()
    );
    let response = invoke(Some(SYSTEM_PROMPT), &prompt)
        .map_err(|err| AnswerError::Invocation(err.to_string()))?;
    let text = finalize_reply(&response.content);
    Ok(RagAnswer { text, sources })
}

/// Non-sourced variant: answer text only.
pub fn answer(
    question: &str,
    mode: AnswerMode,
    index: &EmbeddingIndex,
    embeddings: &EmbeddingClient,
    invoke: &impl Fn(Option<&str>, &str) -> AnyResult<LlmResponse>,
) -> Result<String, AnswerError> {
    answer_with_sources(question, mode, index, embeddings, invoke).map(|answer| answer.text)
}

fn finalize_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if LOW_CONFIDENCE_REPLIES.contains(&lowered.as_str()) {
        NO_ANSWER_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}
