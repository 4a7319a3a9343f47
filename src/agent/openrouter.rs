use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CompletionProvider, ProviderMessage};
use crate::config::Config;
use crate::errors::AppError;

/// Request body for the OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ProviderMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Takes the first candidate's message content as the reply.
fn first_choice_text(response: CompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(AppError::EmptyCompletion)
}

/// OpenRouter chat-completions client. Model, referer and title are fixed
/// at construction; callers only supply messages.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        let mut auth = header_value("OPENROUTER_API_KEY", &format!("Bearer {}", config.api_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("HTTP-Referer", header_value("VERCEL_URL", &config.referer)?);
        headers.insert("X-Title", header_value("CHAT_APP_TITLE", &config.app_title)?);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.provider_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn header_value(key: &str, value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value).map_err(|e| AppError::InvalidConfig {
        key: key.to_string(),
        message: e.to_string(),
    })
}

impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, messages: Vec<ProviderMessage>) -> Result<String, AppError> {
        let body = CompletionRequest { model: &self.model, messages: &messages };
        debug!("Requesting completion from {} with model {}", self.endpoint, self.model);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(AppError::ProviderRequest)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Completion provider at {} answered {status}", self.endpoint);
            let body = response.text().await.unwrap_or_else(|e| {
                warn!("Failed to read error body from {}: {e}", self.endpoint);
                String::new()
            });
            return Err(AppError::ProviderStatus { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse = response.json().await.map_err(AppError::ProviderRequest)?;
        first_choice_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::models::MessageContent;

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(AxumHeaderMap, Value)>>>,
    }

    /// Local stand-in for the provider: `/ok`, `/down` and `/garbled` act as
    /// separate base URLs with their own `/chat/completions` reply.
    async fn stub_completions(
        State(captured): State<Captured>,
        Path(mode): Path<String>,
        headers: AxumHeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        captured.requests.lock().unwrap().push((headers, body));
        match mode.as_str() {
            "ok" => Json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            }))
            .into_response(),
            "down" => (StatusCode::SERVICE_UNAVAILABLE, "provider overloaded").into_response(),
            _ => (StatusCode::OK, "<html>not json</html>").into_response(),
        }
    }

    async fn spawn_stub() -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route("/{mode}/chat/completions", post(stub_completions))
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    fn client_for(base_url: String) -> OpenRouterClient {
        let config = Config {
            api_key: "sk-wire".into(),
            base_url,
            referer: "https://chat.example.com".into(),
            app_title: "Chat Bot".into(),
            provider_timeout_secs: Some(5),
            ..Config::default()
        };
        OpenRouterClient::new(&config).unwrap()
    }

    fn hello() -> Vec<ProviderMessage> {
        vec![ProviderMessage::user(MessageContent::Text("Hello".into()))]
    }

    #[tokio::test]
    async fn completion_sends_routing_headers_and_body() {
        let (base, captured) = spawn_stub().await;
        let reply = client_for(format!("{base}/ok")).complete(hello()).await.unwrap();
        assert_eq!(reply, "hi there");

        let requests = captured.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (headers, body) = &requests[0];
        assert_eq!(headers["authorization"], "Bearer sk-wire");
        assert_eq!(headers["http-referer"], "https://chat.example.com");
        assert_eq!(headers["x-title"], "Chat Bot");
        assert_eq!(
            body,
            &json!({
                "model": "google/gemini-2.0-flash-exp:free",
                "messages": [{"role": "user", "content": "Hello"}]
            })
        );
    }

    #[tokio::test]
    async fn non_success_status_keeps_status_and_body() {
        let (base, _) = spawn_stub().await;
        let err = client_for(format!("{base}/down")).complete(hello()).await.unwrap_err();
        match err {
            AppError::ProviderStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "provider overloaded");
            }
            other => panic!("expected ProviderStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_success_body_is_request_failure() {
        let (base, _) = spawn_stub().await;
        let err = client_for(format!("{base}/garbled")).complete(hello()).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderRequest(_)));
        assert!(err.is_provider_failure());
    }

    fn test_config() -> Config {
        Config {
            api_key: "sk-test".into(),
            base_url: "https://example.invalid/api/v1/".into(),
            ..Config::default()
        }
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let client = OpenRouterClient::new(&test_config()).unwrap();
        assert_eq!(client.endpoint, "https://example.invalid/api/v1/chat/completions");
        assert_eq!(client.model(), "google/gemini-2.0-flash-exp:free");
    }

    #[test]
    fn header_with_newline_is_invalid_config() {
        let config = Config { app_title: "bad\ntitle".into(), ..test_config() };
        let err = OpenRouterClient::new(&config).err().unwrap();
        assert!(matches!(err, AppError::InvalidConfig { ref key, .. } if key == "CHAT_APP_TITLE"));
    }

    #[test]
    fn request_body_uses_model_and_typed_parts() {
        let messages = vec![ProviderMessage::user(MessageContent::from_user_input(
            "describe",
            Some("https://img/x.png"),
        ))];
        let body = CompletionRequest { model: "m", messages: &messages };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "m",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "describe"},
                        {"type": "image_url", "image_url": {"url": "https://img/x.png"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn reply_is_first_choice_content() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        }))
        .unwrap();
        assert_eq!(first_choice_text(response).unwrap(), "first");
    }

    #[test]
    fn no_choices_or_null_content_is_empty_completion() {
        let none: CompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(first_choice_text(none), Err(AppError::EmptyCompletion)));

        let null: CompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert!(matches!(first_choice_text(null), Err(AppError::EmptyCompletion)));
    }
}
