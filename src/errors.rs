use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Top-level application error.
/// Every variant maps onto one HTTP category in [`AppError::status`].
#[derive(Debug, Error)]
pub enum AppError {
    // ── Request validation ───────────────────────────────────────────────────
    #[error("No data provided")]
    MissingBody,

    #[error("Field '{field_name}' is required")]
    EmptyField { field_name: String },

    #[error("Chat '{id}' does not exist")]
    UnknownChatId { id: String },

    // ── Lookup ───────────────────────────────────────────────────────────────
    #[error("Chat '{id}' not found")]
    ChatNotFound { id: String },

    // ── Completion provider ──────────────────────────────────────────────────
    #[error("Completion request failed: {0}")]
    ProviderRequest(#[source] reqwest::Error),

    #[error("Completion provider returned {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Completion provider returned no content")]
    EmptyCompletion,

    // ── Startup ──────────────────────────────────────────────────────────────
    #[error("Environment variable {key} must be set")]
    MissingConfig { key: String },

    #[error("Environment variable {key} is invalid: {message}")]
    InvalidConfig { key: String, message: String },

    // ── System ───────────────────────────────────────────────────────────────
    #[error("Chat history file {path}: {message}")]
    HistoryIo { path: String, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn empty_field(field_name: impl Into<String>) -> Self {
        AppError::EmptyField { field_name: field_name.into() }
    }

    pub fn history_io(path: impl Into<String>, message: impl ToString) -> Self {
        AppError::HistoryIo { path: path.into(), message: message.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ChatNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::MissingBody | AppError::EmptyField { .. } | AppError::UnknownChatId { .. }
        )
    }

    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            AppError::ProviderRequest(_) | AppError::ProviderStatus { .. } | AppError::EmptyCompletion
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Short message shown to the client in the `error` field.
    fn client_message(&self) -> String {
        match self {
            AppError::EmptyField { field_name } if field_name == "message" => {
                "Message is required".to_string()
            }
            AppError::ChatNotFound { .. } => "Chat not found".to_string(),
            e if e.is_provider_failure() => "Failed to get response from AI service".to_string(),
            e if e.is_validation() => e.to_string(),
            _ => "An unexpected error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            // Provider failures are logged where the chat id is known.
            if !self.is_provider_failure() {
                error!("Unexpected error: {self}");
            }
            json!({ "error": self.client_message(), "details": self.to_string() })
        } else {
            json!({ "error": self.client_message() })
        };
        (status, Json(body)).into_response()
    }
}
