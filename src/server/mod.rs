// Web chat server module
// axum application exposing the chat widget and the query endpoint

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::generation::WatsonxGenerator;
use crate::index::VectorStore;
use crate::observability::InteractionLogger;
use crate::retriever::Retriever;
use crate::Result;

/// Shown when retrieval fails before any context is found.
pub const FALLBACK_KNOWLEDGE_BASE: &str =
    "I'm sorry, there was an issue accessing the PM-KISAN knowledge base. Please try again later.";
/// Shown when the index returns nothing for the question.
pub const FALLBACK_NO_CONTEXT: &str = "I'm sorry, I couldn't find relevant information in the \
PM-KISAN documents to answer your question.";
/// Shown when the generation call fails or returns nothing.
pub const FALLBACK_GENERATION: &str = "I apologize, but I ran into a problem while processing \
your question. Please try rephrasing it.";
/// Shown for a blank question; no network call is made.
pub const PROMPT_FOR_QUESTION: &str = "Please type a question about the PM-KISAN scheme.";

/// Everything a query needs, constructed once at startup and shared
/// read-only across requests.
pub struct AppState {
    pub retriever: Retriever,
    pub generator: WatsonxGenerator,
    pub logger: InteractionLogger,
    pub store: Arc<VectorStore>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    indexed_passages: u64,
}

#[inline]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(chat_page))
        .route("/healthz", get(health))
        .route("/api/chat", post(chat))
        .with_state(state)
}

/// Bind and serve the chat interface until the process is stopped.
#[inline]
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(
        "Chat interface listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn chat_page() -> Html<&'static str> {
    Html(include_str!("chat.html"))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let indexed_passages = state.store.count().await.unwrap_or(0);
    Json(HealthResponse {
        status: "ok",
        indexed_passages,
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let answer = answer_question(&state, &request.question).await;
    Json(ChatResponse { answer })
}

/// The straight-line query cycle: retrieve, generate, log.
///
/// Query-time failures never escape as errors; they become plain-language
/// fallback messages, and only successfully answered queries are logged.
async fn answer_question(state: &AppState, question: &str) -> String {
    let question = question.trim();
    if question.is_empty() {
        return PROMPT_FOR_QUESTION.to_string();
    }

    let passages = match state.retriever.retrieve(question).await {
        Ok(passages) => passages,
        Err(e) => {
            error!("Retrieval failed: {}", e);
            return FALLBACK_KNOWLEDGE_BASE.to_string();
        }
    };

    if passages.is_empty() {
        return FALLBACK_NO_CONTEXT.to_string();
    }

    let contexts: Vec<String> = passages.into_iter().map(|p| p.text).collect();

    let answer = match state.generator.generate(question, &contexts) {
        Ok(answer) => answer,
        Err(e) => {
            error!("Generation failed: {}", e);
            return FALLBACK_GENERATION.to_string();
        }
    };

    if let Err(e) = state.logger.log(question, &contexts, &answer) {
        // Losing a log line must not fail the user's query.
        warn!("Failed to log interaction: {}", e);
    }

    answer
}

/// Build the shared application state from already-constructed components.
#[inline]
pub fn app_state(
    retriever: Retriever,
    generator: WatsonxGenerator,
    logger: InteractionLogger,
    store: Arc<VectorStore>,
) -> Arc<AppState> {
    Arc::new(AppState {
        retriever,
        generator,
        logger,
        store,
    })
}
