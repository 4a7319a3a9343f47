pub mod openrouter;

use std::future::Future;

use serde::Serialize;

use crate::errors::AppError;
use crate::models::{MessageContent, MessageRole};

pub use openrouter::OpenRouterClient;

/// One role-tagged entry of the provider's `messages` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl ProviderMessage {
    pub fn user(content: MessageContent) -> Self {
        Self { role: MessageRole::User, content }
    }
}

/// A remote chat-completion service that turns a message list into reply text.
pub trait CompletionProvider: Send + Sync + 'static {
    fn complete(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}
