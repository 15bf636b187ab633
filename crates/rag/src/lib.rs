pub mod answer;
pub mod chart;
pub mod embedding;
pub mod fetch;
pub mod indexer;
pub mod insight;
pub mod refine;
pub mod session;
pub mod web;

pub use answer::{
    answer, answer_with_sources, AnswerError, AnswerMode, RagAnswer, NO_ANSWER_MESSAGE,
    NO_DOCUMENT_MESSAGE, TOP_K,
};
pub use chart::{extract_metric_values, render_bar_chart, ChartError};
pub use embedding::{EmbeddingBackend, EmbeddingClient};
pub use fetch::fetch_document;
pub use indexer::{build_index, BuildError};
pub use insight::{extract_metrics, is_failure, summarize, FAILURE_PREFIX, INSIGHT_CHAR_BUDGET};
pub use refine::{is_response_poor, refinement_suggestions};
pub use session::{parse_transcript, ChatRole, ChatTurn, DocumentState, Session};
pub use web::{search_web, WebSearchError, NO_RESULTS_FALLBACK};

pub use finsight_llm::{default_model, GatewayError, LlmClient, LlmProvider, LlmRequest, LlmResponse};
