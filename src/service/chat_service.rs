use std::sync::Arc;

use tracing::{debug, error};

use crate::agent::{CompletionProvider, ProviderMessage};
use crate::db::ChatStore;
use crate::errors::AppError;
use crate::models::{ChatRecord, ChatRequest, ChatResponse, Message, MessageContent, MessageRole};

/// Runs exchanges against a [`ChatStore`] and a [`CompletionProvider`].
pub struct ChatService<S, P> {
    store: Arc<S>,
    provider: Arc<P>,
}

impl<S, P> Clone for ChatService<S, P> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), provider: Arc::clone(&self.provider) }
    }
}

/// Empty strings count as absent, matching how the page posts blank fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl<S: ChatStore, P: CompletionProvider> ChatService<S, P> {
    pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
        Self { store, provider }
    }

    pub async fn get_chats(&self) -> Result<Vec<ChatRecord>, AppError> {
        self.store.list_chats().await
    }

    pub async fn get_chat(&self, id: &str) -> Result<ChatRecord, AppError> {
        self.store.get_chat(id).await
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        // ── Validation ────────────────────────────────────────────────────────
        let message = non_empty(request.message).ok_or_else(|| AppError::empty_field("message"))?;
        let image_url = non_empty(request.image_url);
        let requested_id = non_empty(request.chat_id);

        // ── Resolve or create chat ────────────────────────────────────────────
        let chat_id = self.store.get_or_create_chat(requested_id.as_deref(), &message).await?;

        // ── Record the user turn ──────────────────────────────────────────────
        let content = MessageContent::from_user_input(&message, image_url.as_deref());
        self.store
            .append_message(&chat_id, Message::new(MessageRole::User, content.clone()))
            .await?;
        debug!("Appended user message to chat {chat_id}");

        // ── Ask the provider; a failure leaves the user turn in place ─────────
        let reply = self
            .provider
            .complete(vec![ProviderMessage::user(content)])
            .await
            .inspect_err(|e| error!("Completion failed for chat {chat_id}: {e}"))?;

        self.store
            .append_message(&chat_id, Message::new(MessageRole::Assistant, reply.clone()))
            .await?;
        debug!("Appended assistant reply to chat {chat_id}");

        Ok(ChatResponse { content: reply, chat_id })
    }
}
