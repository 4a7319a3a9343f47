//! Service configuration, read from environment variables at startup.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";
const DEFAULT_REFERER: &str = "http://localhost:5000";
const DEFAULT_APP_TITLE: &str = "Chat Bot";
const DEFAULT_HISTORY_FILE: &str = "/tmp/chat_history.json";

#[derive(Clone)]
pub struct Config {
    /// Provider credential. Has no default; see [`Config::from_env`].
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Sent as `HTTP-Referer` on every completion request.
    pub referer: String,
    /// Sent as `X-Title` on every completion request.
    pub app_title: String,
    /// `None` waits on the provider indefinitely.
    pub provider_timeout_secs: Option<u64>,
    pub history_file: PathBuf,
    /// Load `history_file` at startup and write it back at shutdown.
    pub persist_history: bool,
    pub cors_permissive: bool,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            provider_timeout_secs: None,
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            persist_history: false,
            cors_permissive: false,
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("app_title", &self.app_title)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("history_file", &self.history_file)
            .field("persist_history", &self.persist_history)
            .field("cors_permissive", &self.cors_permissive)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Builds the config from the process environment. Fails when
    /// `OPENROUTER_API_KEY` is unset or blank.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("OPENROUTER_API_KEY").ok_or_else(|| AppError::MissingConfig {
            key: "OPENROUTER_API_KEY".to_string(),
        })?;

        Ok(Self {
            api_key,
            base_url: var("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            model: var("CHAT_MODEL").unwrap_or(defaults.model),
            referer: var("VERCEL_URL").unwrap_or(defaults.referer),
            app_title: var("CHAT_APP_TITLE").unwrap_or(defaults.app_title),
            provider_timeout_secs: parse_var(&var, "PROVIDER_TIMEOUT_SECS")?,
            history_file: var("CHAT_HISTORY_FILE").map(PathBuf::from).unwrap_or(defaults.history_file),
            persist_history: parse_flag(&var, "CHAT_HISTORY_PERSIST")?,
            cors_permissive: parse_flag(&var, "CORS_PERMISSIVE")?,
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_var(&var, "PORT")?.unwrap_or(defaults.port),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| AppError::InvalidConfig {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

fn parse_flag(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, AppError> {
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no") => Ok(false),
        Some(v) => Err(AppError::InvalidConfig {
            key: key.to_string(),
            message: format!("expected a boolean, got {v:?}"),
        }),
    }
}
