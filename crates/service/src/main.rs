mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::get, routing::post, Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task;
use tracing::{error, info};

use finsight_core::{load, ChunkConfig, Chunker, FileFormat};
use finsight_llm::{LlmClient, LlmProvider, LlmRequest};
use finsight_rag::{
    answer_with_sources, build_index, extract_metric_values, extract_metrics, fetch_document,
    is_response_poor, refinement_suggestions, render_bar_chart, search_web, summarize, AnswerMode,
    DocumentState, EmbeddingClient, Session, NO_DOCUMENT_MESSAGE,
};

use crate::config::AppConfig;

struct AppState {
    config: AppConfig,
    session: Mutex<Session>,
    embeddings: EmbeddingClient,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    let config = AppConfig::from_env()?;
    let embeddings = EmbeddingClient::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        config,
        session: Mutex::new(Session::new()),
        embeddings,
    });
    let app = Router::new()
        .route("/", get(serve_ui))
        .route("/documents", post(handle_upload))
        .route("/documents/url", post(handle_fetch))
        .route("/ask", post(handle_ask))
        .route("/reset", post(handle_reset))
        .route("/export/chat", get(export_chat))
        .route("/export/insights", get(export_insights))
        .route("/insights/chart", get(insights_chart))
        .route("/search", get(handle_search))
        .with_state(state);
    let addr: SocketAddr = bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ModelParams {
    provider: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct DocumentResponse {
    filename: String,
    chunks: usize,
    summary: String,
    insights: String,
}

#[derive(Debug, Deserialize)]
struct FetchRequest {
    url: String,
    provider: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
    provider: Option<String>,
    temperature: Option<f32>,
    mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<String>,
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
}

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ModelParams>,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>, AppError> {
    let uploaded = extract_file(&mut multipart).await?;
    let filename = uploaded
        .filename
        .clone()
        .ok_or_else(|| AppError::bad_request("upload is missing a file name"))?;
    let format = FileFormat::from_name(&filename).map_err(AppError::bad_request)?;
    let (provider, temperature) = resolve_model_params(&state, params.provider, params.temperature)?;
    let response = task::spawn_blocking(move || {
        ingest_document(&state, filename, &uploaded.data, format, provider, temperature)
    })
    .await
    .map_err(AppError::internal)??;
    Ok(Json(response))
}

async fn handle_fetch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FetchRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let (provider, temperature) = resolve_model_params(&state, body.provider, body.temperature)?;
    let response = task::spawn_blocking(move || {
        let (bytes, format) = fetch_document(&body.url).map_err(AppError::bad_request)?;
        let filename = filename_from_url(&body.url, format);
        ingest_document(&state, filename, &bytes, format, provider, temperature)
    })
    .await
    .map_err(AppError::internal)??;
    Ok(Json(response))
}

async fn handle_ask(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = body.question.trim().to_string();
    if question.is_empty() {
        return Err(AppError::bad_request("question must not be empty"));
    }
    let (provider, temperature) = resolve_model_params(&state, body.provider, body.temperature)?;
    let mode = match body.mode.as_deref() {
        Some(raw) => AnswerMode::from_str(raw)
            .ok_or_else(|| AppError::bad_request(format!("unknown response mode {raw}")))?,
        None => AnswerMode::Concise,
    };
    let response =
        task::spawn_blocking(move || run_ask(&state, question, provider, temperature, mode))
            .await
            .map_err(AppError::internal)??;
    Ok(Json(response))
}

async fn handle_reset(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.lock().reset();
    StatusCode::NO_CONTENT
}

async fn export_chat(State(state): State<Arc<AppState>>) -> Response {
    let transcript = state.session.lock().export_transcript();
    plain_text(transcript)
}

async fn export_insights(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let insights = state
        .session
        .lock()
        .export_insights()
        .ok_or_else(|| AppError::not_found("no document has been uploaded yet"))?;
    Ok(plain_text(insights))
}

async fn insights_chart(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let insights = state
        .session
        .lock()
        .document()
        .map(|doc| doc.insights.clone())
        .ok_or_else(|| AppError::not_found("no document has been uploaded yet"))?;
    let values = extract_metric_values(&insights);
    let png = render_bar_chart(&values).map_err(AppError::bad_request)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn handle_search(
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let snippet = task::spawn_blocking(move || search_web(&params.q))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::bad_request)?;
    Ok(plain_text(snippet))
}

async fn serve_ui() -> Html<&'static str> {
    Html(include_str!("../../../ui/index.html"))
}

/// Loader -> chunker -> index build -> summary and metrics, then the
/// session's document state is replaced wholesale.
fn ingest_document(
    state: &AppState,
    filename: String,
    bytes: &[u8],
    format: FileFormat,
    provider: LlmProvider,
    temperature: f32,
) -> Result<DocumentResponse, AppError> {
    let text = load(bytes, format).map_err(AppError::bad_request)?;
    let chunks = Chunker::new(ChunkConfig::default())
        .split(&text)
        .map_err(AppError::bad_request)?;
    let chunk_count = chunks.len();
    let index = build_index(chunks, &state.embeddings).map_err(AppError::internal)?;
    let client = LlmClient::new(provider, state.config.model_for(provider), temperature)
        .map_err(AppError::bad_request)?;
    let invoke = invoke_fn(&client);
    let summary = summarize(&text, &invoke);
    let insights = extract_metrics(&text, &invoke);
    info!(
        "document" = %filename,
        "format" = format.as_str(),
        "chunks" = chunk_count,
        "document indexed"
    );
    state.session.lock().install_document(DocumentState {
        filename: filename.clone(),
        index,
        summary: summary.clone(),
        insights: insights.clone(),
    });
    Ok(DocumentResponse {
        filename,
        chunks: chunk_count,
        summary,
        insights,
    })
}

/// Without a document the model is never invoked; the static guidance
/// message is the reply. Pipeline failures render inline as the assistant's
/// response rather than failing the request.
fn run_ask(
    state: &AppState,
    question: String,
    provider: LlmProvider,
    temperature: f32,
    mode: AnswerMode,
) -> Result<AskResponse, AppError> {
    let mut session = state.session.lock();
    let (answer_text, sources) = match session.document() {
        None => (NO_DOCUMENT_MESSAGE.to_string(), Vec::new()),
        Some(doc) => {
            let client = LlmClient::new(provider, state.config.model_for(provider), temperature)
                .map_err(AppError::bad_request)?;
            let invoke = invoke_fn(&client);
            match answer_with_sources(&question, mode, &doc.index, &state.embeddings, &invoke) {
                Ok(answer) => (answer.text, answer.sources),
                Err(err) => (err.to_string(), Vec::new()),
            }
        }
    };
    session.push_user(&question);
    session.push_assistant(&answer_text);
    let suggestions = if is_response_poor(&answer_text) {
        refinement_suggestions()
            .iter()
            .map(|tip| tip.to_string())
            .collect()
    } else {
        Vec::new()
    };
    Ok(AskResponse {
        answer: answer_text,
        sources,
        suggestions,
    })
}

fn invoke_fn(
    client: &LlmClient,
) -> impl Fn(Option<&str>, &str) -> anyhow::Result<finsight_llm::LlmResponse> + '_ {
    move |system: Option<&str>, user: &str| {
        client
            .chat_blocking(&LlmRequest {
                system: system.map(|s| s.to_string()),
                user: user.to_string(),
            })
            .map_err(anyhow::Error::from)
    }
}

fn resolve_model_params(
    state: &AppState,
    provider: Option<String>,
    temperature: Option<f32>,
) -> Result<(LlmProvider, f32), AppError> {
    let provider = match provider {
        Some(name) => LlmProvider::parse(&name).map_err(AppError::bad_request)?,
        None => state.config.provider,
    };
    let temperature = temperature.unwrap_or(state.config.temperature);
    if !(0.0..=1.0).contains(&temperature) {
        return Err(AppError::bad_request(
            "temperature must be between 0.0 and 1.0",
        ));
    }
    Ok((provider, temperature))
}

fn filename_from_url(url: &str, format: FileFormat) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("download.{}", format.as_str()))
}

struct UploadedFile {
    data: Vec<u8>,
    filename: Option<String>,
}

async fn extract_file(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::bad_request)?
    {
        if let Some(name) = field.name() {
            if name == "file" {
                let filename = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(AppError::bad_request)?;
                return Ok(UploadedFile {
                    data: data.to_vec(),
                    filename,
                });
            }
        }
    }
    Err(AppError::bad_request("missing file"))
}

fn plain_text(body: impl Into<String>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn bad_request<E: ToString>(msg: E) -> Self {
        Self::BadRequest(msg.to_string())
    }

    fn not_found<E: ToString>(msg: E) -> Self {
        Self::NotFound(msg.to_string())
    }

    fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::Internal(err) => {
                error!("internal_error" = %err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
