//! HTTP client for the review long-polling endpoint

use crate::config::ConfigError;
use crate::error::sanitize_error_message;
use crate::review::{AttemptSource, Cursor, PollError, PollResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Review API client configuration
#[derive(Debug, Clone)]
pub struct ReviewApiConfig {
    pub url: String,
    pub token: String,
    pub timeout: Duration,
}

impl Default for ReviewApiConfig {
    fn default() -> Self {
        Self {
            url: "https://dvmn.org/api/long_polling/".to_string(),
            token: String::new(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Long-polling client authenticated with a static token
pub struct ReviewApiClient {
    config: ReviewApiConfig,
    client: Client,
}

impl ReviewApiClient {
    /// Set up the client. A missing token is a configuration problem, not a
    /// polling failure.
    pub fn new(config: ReviewApiConfig) -> Result<Self, ConfigError> {
        if config.token.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Review API token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfig(format!("Review API client setup failed: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Map a transport-level failure onto the loop's error classes (pure)
    fn classify_error(error: reqwest::Error) -> PollError {
        if error.is_timeout() {
            return PollError::Timeout;
        }

        let connect = error.is_connect();
        let decode = error.is_decode();
        let message = sanitize_error_message(&error.without_url().to_string());

        if connect {
            PollError::Connection(message)
        } else if decode {
            PollError::Decode(message)
        } else {
            PollError::Request(message)
        }
    }

    /// Parse a response body (pure)
    fn parse_body(body: &str) -> Result<PollResponse, PollError> {
        serde_json::from_str(body).map_err(|e| {
            PollError::Decode(format!(
                "{e} in body: {}",
                sanitize_error_message(body)
            ))
        })
    }
}

#[async_trait]
impl AttemptSource for ReviewApiClient {
    async fn fetch_updates(&self, cursor: Option<&Cursor>) -> Result<PollResponse, PollError> {
        let mut request = self
            .client
            .get(&self.config.url)
            .header("Authorization", format!("Token {}", self.config.token));

        if let Some(cursor) = cursor {
            request = request.query(&[("timestamp", cursor.as_str())]);
        }

        debug!(
            cursor = cursor.map(Cursor::as_str).unwrap_or("none"),
            "Polling review API"
        );

        let response = request.send().await.map_err(Self::classify_error)?;
        let status = response.status();
        let body = response.text().await.map_err(Self::classify_error)?;

        if !status.is_success() {
            return Err(PollError::Status {
                status: status.as_u16(),
                body: sanitize_error_message(&body),
            });
        }

        Self::parse_body(&body)
    }
}
