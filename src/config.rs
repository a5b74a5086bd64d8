//! Configuration for the review notifier
//!
//! Settings come from an optional TOML file. Secrets are never written to the
//! file: it only names the environment variables that hold them, and those are
//! resolved at runtime.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;
use url::Url;

/// Main notifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotifierConfig {
    #[serde(default)]
    pub review_api: ReviewApiSection,
    #[serde(default)]
    pub telegram: TelegramSection,
}

/// Review API section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewApiSection {
    /// Long-polling endpoint
    #[serde(default = "default_review_api_url")]
    pub url: String,
    /// Environment variable containing the API token
    #[serde(default = "default_review_token_env")]
    pub token_env: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_review_timeout")]
    pub request_timeout_secs: u64,
    /// Pause after a connection failure, in seconds
    #[serde(default = "default_connection_retry_delay")]
    pub connection_retry_delay_secs: u64,
}

fn default_review_api_url() -> String {
    "https://dvmn.org/api/long_polling/".to_string()
}

fn default_review_token_env() -> String {
    "API_DEVMAN_TOKEN".to_string()
}

fn default_review_timeout() -> u64 {
    5
}

fn default_connection_retry_delay() -> u64 {
    10
}

impl Default for ReviewApiSection {
    fn default() -> Self {
        Self {
            url: default_review_api_url(),
            token_env: default_review_token_env(),
            request_timeout_secs: default_review_timeout(),
            connection_retry_delay_secs: default_connection_retry_delay(),
        }
    }
}

/// Telegram section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelegramSection {
    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Environment variable containing the bot token
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,
    /// Environment variable containing the target chat id
    #[serde(default = "default_chat_id_env")]
    pub chat_id_env: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_telegram_timeout")]
    pub request_timeout_secs: u64,
    /// Minimum level of log lines forwarded to the chat
    #[serde(default = "default_chat_log_level")]
    pub log_level: String,
    /// Whether the notifier's own log lines go to the chat at all
    #[serde(default = "default_forward_logs")]
    pub forward_logs: bool,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_bot_token_env() -> String {
    "TG_BOT_TOKEN".to_string()
}

fn default_chat_id_env() -> String {
    "TG_CHAT_ID".to_string()
}

fn default_telegram_timeout() -> u64 {
    10
}

fn default_chat_log_level() -> String {
    "INFO".to_string()
}

fn default_forward_logs() -> bool {
    true
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            api_url: default_telegram_api_url(),
            bot_token_env: default_bot_token_env(),
            chat_id_env: default_chat_id_env(),
            request_timeout_secs: default_telegram_timeout(),
            log_level: default_chat_log_level(),
            forward_logs: default_forward_logs(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NotifierConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NotifierConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("review_api.url", &self.review_api.url)?;
        validate_url("telegram.api_url", &self.telegram.api_url)?;

        if self.review_api.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "review_api.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.review_api.connection_retry_delay_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "review_api.connection_retry_delay_secs must be greater than zero".to_string(),
            ));
        }
        if self.telegram.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "telegram.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        parse_level(&self.telegram.log_level).ok_or_else(|| {
            ConfigError::InvalidConfig(format!(
                "telegram.log_level '{}' is not one of ERROR, WARN, INFO, DEBUG, TRACE",
                self.telegram.log_level
            ))
        })?;

        Ok(())
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        match std::env::var(env_var_name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::EnvVarNotFound(env_var_name.to_string())),
        }
    }

    /// Get the review API token from its environment variable
    pub fn get_review_api_token(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.review_api.token_env)
    }

    /// Get the bot token from its environment variable
    pub fn get_bot_token(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.telegram.bot_token_env)
    }

    /// Get the target chat id from its environment variable
    pub fn get_chat_id(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.telegram.chat_id_env).map(|id| id.trim().to_string())
    }

    pub fn review_request_timeout(&self) -> Duration {
        Duration::from_secs(self.review_api.request_timeout_secs)
    }

    pub fn connection_retry_delay(&self) -> Duration {
        Duration::from_secs(self.review_api.connection_retry_delay_secs)
    }

    pub fn telegram_request_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.request_timeout_secs)
    }

    /// Minimum level forwarded to the chat. Validated on load, INFO otherwise.
    pub fn chat_log_level(&self) -> Level {
        parse_level(&self.telegram.log_level).unwrap_or(Level::INFO)
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidConfig(format!("{field} '{value}' is not a URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidConfig(format!(
            "{field} must use http or https, got '{scheme}'"
        ))),
    }
}

/// Parse a level name, case-insensitively
pub fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}
