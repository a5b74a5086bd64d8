//! Telegram Bot API client

use crate::error::sanitize_error_message;
use crate::telegram::{ChatError, ChatSink};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram client configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Bot that posts plain-text messages
pub struct TelegramBot {
    client: Client,
    send_url: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramBot {
    pub fn new(config: TelegramConfig) -> Result<Self, ChatError> {
        if config.bot_token.is_empty() {
            return Err(ChatError::NotConfigured(
                "Telegram bot token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Network(e.without_url().to_string()))?;

        let send_url = format!(
            "{}/bot{}/sendMessage",
            config.api_url.trim_end_matches('/'),
            config.bot_token
        );

        Ok(Self { client, send_url })
    }

    /// Interpret the API envelope (pure)
    fn check_response(status: u16, body: &str) -> Result<(), ChatError> {
        let parsed: ApiResponse = serde_json::from_str(body).map_err(|e| {
            ChatError::Decode(format!(
                "HTTP {status}, {e}: {}",
                sanitize_error_message(body)
            ))
        })?;

        if parsed.ok {
            return Ok(());
        }

        Err(ChatError::Api {
            code: parsed.error_code.unwrap_or(i64::from(status)),
            description: sanitize_error_message(
                parsed.description.as_deref().unwrap_or("no description"),
            ),
        })
    }
}

#[async_trait]
impl ChatSink for TelegramBot {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChatError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&self.send_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Network(sanitize_error_message(&e.without_url().to_string())))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Network(sanitize_error_message(&e.without_url().to_string())))?;

        Self::check_response(status, &body)
    }
}
