use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error};

use super::errors::ApiError;
use super::{AppState, ChainState};
use crate::rag::{Answer, content_preview, source_file_name};

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
}

/// Citation as shown to the browser
#[derive(Debug, Serialize)]
pub struct SourceView {
    pub title: String,
    pub source: String,
    pub content: String,
}

impl From<Answer> for ChatResponse {
    #[inline]
    fn from(answer: Answer) -> Self {
        let sources = answer
            .sources
            .into_iter()
            .map(|result| SourceView {
                source: source_file_name(&result.metadata.source),
                content: content_preview(&result.text),
                title: result.metadata.title,
            })
            .collect();

        Self {
            answer: answer.answer,
            sources,
        }
    }
}

#[inline]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[inline]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.chain {
        ChainState::Ready(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "ready": true })),
        ),
        ChainState::Unavailable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "ready": false, "reason": reason })),
        ),
    }
}

#[inline]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let ChainState::Ready(chain) = &state.chain else {
        return Err(ApiError::NotInitialized);
    };

    let Json(body) =
        payload.map_err(|e| ApiError::BadRequest(format!("Invalid request: {}", e.body_text())))?;

    let query = match body.get("query") {
        Some(Value::String(query)) if !query.trim().is_empty() => query.as_str(),
        _ => return Err(ApiError::BadRequest("No query provided".to_string())),
    };
    debug!("Chat query: {}", query);

    match chain.answer(query).await {
        Ok(answer) => Ok(Json(answer.into())),
        Err(e) => {
            error!("Error during query: {}", e);
            Err(ApiError::Internal(e.to_string()))
        }
    }
}
