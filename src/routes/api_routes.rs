use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use tracing::debug;

use crate::agent::CompletionProvider;
use crate::db::ChatStore;
use crate::errors::AppError;
use crate::models::{ChatRecord, ChatRequest, ChatResponse};
use crate::service::chat_service::ChatService;

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET `/api/chats` — every chat, newest first
pub async fn list_chats_handler<S: ChatStore, P: CompletionProvider>(
    State(svc): State<ChatService<S, P>>,
) -> Result<Json<Vec<ChatRecord>>, AppError> {
    Ok(Json(svc.get_chats().await?))
}

/// GET `/api/chats/{id}` — one chat with its transcript
pub async fn get_chat_handler<S: ChatStore, P: CompletionProvider>(
    Path(id): Path<String>,
    State(svc): State<ChatService<S, P>>,
) -> Result<Json<ChatRecord>, AppError> {
    Ok(Json(svc.get_chat(&id).await?))
}

/// POST `/api` — one exchange: `{message, image_url?, chat_id?}` in, `{content, chat_id}` out
pub async fn chat_handler<S: ChatStore, P: CompletionProvider>(
    State(svc): State<ChatService<S, P>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(value) = body.map_err(|rejection| {
        debug!("Rejected chat request body: {rejection}");
        AppError::MissingBody
    })?;
    Ok(Json(svc.chat(parse_chat_request(value)?).await?))
}

// ── Helper ────────────────────────────────────────────────────────────────────

/// An absent, `null` or `{}` body carries no data at all.
fn parse_chat_request(value: Value) -> Result<ChatRequest, AppError> {
    match &value {
        Value::Object(fields) if !fields.is_empty() => {}
        _ => return Err(AppError::MissingBody),
    }
    serde_json::from_value(value).map_err(|e| {
        debug!("Chat request body has unexpected field types: {e}");
        AppError::MissingBody
    })
}
