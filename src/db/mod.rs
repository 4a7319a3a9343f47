//! Chat storage.
//!
//! [`ChatStore`] is the seam between the exchange logic and wherever chats
//! live. The default backend is [`memory_store::InMemoryChatStore`]; the
//! [`history_file`] helpers snapshot it to a flat JSON file.
//!
//! Trait methods return `impl Future + Send` so no extra trait crate is needed.

pub mod history_file;
pub mod memory_store;

use std::future::Future;

use crate::errors::AppError;
use crate::models::{ChatRecord, Message};

pub trait ChatStore: Send + Sync + 'static {
    /// All chats, newest `created_at` first.
    fn list_chats(&self) -> impl Future<Output = Result<Vec<ChatRecord>, AppError>> + Send;

    /// Fails with [`AppError::ChatNotFound`] when `id` is unknown.
    fn get_chat(&self, id: &str) -> impl Future<Output = Result<ChatRecord, AppError>> + Send;

    /// Returns the id of an existing chat, or of a chat freshly created from
    /// `first_message` when `id` is `None`. An unknown `id` is rejected with
    /// [`AppError::UnknownChatId`]; nothing is ever created under a
    /// caller-supplied id.
    fn get_or_create_chat(
        &self,
        id: Option<&str>,
        first_message: &str,
    ) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Appends to the end of an existing chat's transcript.
    fn append_message(
        &self,
        id: &str,
        message: Message,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Point-in-time copy of every chat, for persistence.
    fn snapshot(&self) -> impl Future<Output = Result<Vec<ChatRecord>, AppError>> + Send {
        self.list_chats()
    }
}
