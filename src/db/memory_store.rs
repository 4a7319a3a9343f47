use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use super::ChatStore;
use crate::errors::AppError;
use crate::models::{ChatRecord, Message};

/// Process-lifetime chat store.
///
/// Each record sits behind its own mutex, so appends to one chat are
/// serialised while different chats only share the brief map read-lock.
#[derive(Default)]
pub struct InMemoryChatStore {
    chats: RwLock<HashMap<String, Arc<Mutex<ChatRecord>>>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, e.g. from a history snapshot. Later duplicates of an id are dropped.
    pub fn from_records(records: Vec<ChatRecord>) -> Self {
        let mut chats = HashMap::with_capacity(records.len());
        for record in records {
            match chats.entry(record.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Mutex::new(record)));
                }
                Entry::Occupied(_) => warn!("Skipping duplicate chat id {} in history", record.id),
            }
        }
        Self { chats: RwLock::new(chats) }
    }

    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chats.read().await.is_empty()
    }

    async fn handle(&self, id: &str) -> Option<Arc<Mutex<ChatRecord>>> {
        self.chats.read().await.get(id).cloned()
    }
}

impl ChatStore for InMemoryChatStore {
    async fn list_chats(&self) -> Result<Vec<ChatRecord>, AppError> {
        let handles: Vec<_> = self.chats.read().await.values().cloned().collect();
        let mut chats = Vec::with_capacity(handles.len());
        for handle in handles {
            chats.push(handle.lock().await.clone());
        }
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chats)
    }

    async fn get_chat(&self, id: &str) -> Result<ChatRecord, AppError> {
        let handle = self
            .handle(id)
            .await
            .ok_or_else(|| AppError::ChatNotFound { id: id.to_string() })?;
        let record = handle.lock().await.clone();
        Ok(record)
    }

    async fn get_or_create_chat(
        &self,
        id: Option<&str>,
        first_message: &str,
    ) -> Result<String, AppError> {
        if let Some(id) = id {
            return if self.chats.read().await.contains_key(id) {
                Ok(id.to_string())
            } else {
                Err(AppError::UnknownChatId { id: id.to_string() })
            };
        }

        let mut chats = self.chats.write().await;
        loop {
            let id = Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = chats.entry(id.clone()) {
                let record = ChatRecord::new(id.clone(), first_message);
                debug!("Created chat {id} titled {:?}", record.title);
                slot.insert(Arc::new(Mutex::new(record)));
                return Ok(id);
            }
        }
    }

    async fn append_message(&self, id: &str, message: Message) -> Result<(), AppError> {
        let handle = self
            .handle(id)
            .await
            .ok_or_else(|| AppError::ChatNotFound { id: id.to_string() })?;
        handle.lock().await.messages.push(message);
        Ok(())
    }
}
