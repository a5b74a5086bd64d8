//! Chat delivery
//!
//! Nothing in this module may emit `tracing` events: the chat log layer
//! forwards log lines through it and skips this module's targets only by
//! convention.

use async_trait::async_trait;
use thiserror::Error;

pub mod client;

pub use client::{TelegramBot, TelegramConfig};

/// Maximum length of a single chat message, in characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Chat delivery errors. Never contain the bot token.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChatError {
    #[error("Chat client is not configured: {0}")]
    NotConfigured(String),

    #[error("Chat request failed: {0}")]
    Network(String),

    #[error("Chat API rejected message ({code}): {description}")]
    Api { code: i64, description: String },

    #[error("Unexpected chat API response: {0}")]
    Decode(String),
}

/// Destination for formatted messages
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChatError>;
}

/// Cut `text` to the platform message limit, marking the cut
pub fn truncate_for_chat(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }

    let suffix = "…";
    let keep = MAX_MESSAGE_CHARS - suffix.chars().count();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(suffix);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate_for_chat("hello"), "hello");
    }

    #[test]
    fn test_long_text_truncated_to_limit() {
        let text = "я".repeat(MAX_MESSAGE_CHARS + 10);
        let truncated = truncate_for_chat(&text);

        assert_eq!(truncated.chars().count(), MAX_MESSAGE_CHARS);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_text_at_limit_unchanged() {
        let text = "x".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(truncate_for_chat(&text), text);
    }
}
