use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 50;
const TITLE_TRUNCATION_MARKER: &str = "...";

/// A chat session: metadata plus its append-only transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl ChatRecord {
    /// Starts an empty chat whose title is derived from `first_message`.
    pub fn new(id: String, first_message: &str) -> Self {
        Self {
            id,
            title: derive_title(first_message),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }
}

/// First 50 characters of the message, with `...` appended only when something was cut.
pub fn derive_title(message: &str) -> String {
    if message.chars().count() > TITLE_MAX_CHARS {
        let head: String = message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}{TITLE_TRUNCATION_MARKER}")
    } else {
        message.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message body: plain text, or a list of typed parts when an image is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Text part followed by an image reference when `image_url` is given.
    pub fn from_user_input(message: &str, image_url: Option<&str>) -> Self {
        match image_url {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text { text: message.to_string() },
                ContentPart::ImageUrl { image_url: ImageUrl { url: url.to_string() } },
            ]),
            None => MessageContent::Text(message.to_string()),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<MessageContent>) -> Self {
        Self { role, content: content.into(), timestamp: Utc::now() }
    }
}

/// Body of `POST /api`. Every field is optional on the wire so that the
/// service, not the extractor, decides what counts as missing.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub chat_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_message_becomes_title_verbatim() {
        assert_eq!(derive_title("Hello"), "Hello");
        let exactly_fifty = "a".repeat(50);
        assert_eq!(derive_title(&exactly_fifty), exactly_fifty);
    }

    #[test]
    fn long_message_is_truncated_with_marker() {
        let message = "x".repeat(60);
        let title = derive_title(&message);
        assert_eq!(title, format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let message = "é".repeat(51);
        assert_eq!(derive_title(&message), format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn plain_text_content_serializes_as_string() {
        let msg = Message::new(MessageRole::User, "Hello".to_string());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "Hello");
    }

    #[test]
    fn image_content_serializes_as_typed_parts() {
        let content = MessageContent::from_user_input("what is this?", Some("https://img/cat.png"));
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!([
                {"type": "text", "text": "what is this?"},
                {"type": "image_url", "image_url": {"url": "https://img/cat.png"}}
            ])
        );
    }

    #[test]
    fn request_fields_default_to_none() {
        let req: ChatRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.message.is_none());
        assert!(req.image_url.is_none());
        assert!(req.chat_id.is_none());
    }
}
