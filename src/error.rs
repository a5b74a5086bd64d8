//! Error types for the review notifier
//!
//! Every concern carries its own error enum; [`NotifierError`] wraps them for
//! the binary entry point. Text that may end up in the chat or the log goes
//! through [`sanitize_error_message`] first.

use crate::config::ConfigError;
use crate::review::PollError;
use crate::telegram::ChatError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Review API error: {0}")]
    PollError(#[from] PollError),

    #[error("Chat error: {0}")]
    ChatError(#[from] ChatError),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl NotifierError {
    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Result type for notifier operations
pub type NotifierResult<T> = Result<T, NotifierError>;

const MAX_MESSAGE_LEN: usize = 500;

static SECRET_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\w*_)?(password|token|key|secret)[=:]\s*\S+")
        .expect("valid secret pattern")
});

static AUTHORIZATION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(authorization:?\s*)(token|bearer)\s+\S+").expect("valid header pattern")
});

static BOT_TOKEN_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/bot\d+:[A-Za-z0-9_-]+").expect("valid bot token pattern")
});

/// Remove credentials from a message and cap its length
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = BOT_TOKEN_PATH
        .replace_all(message, "/bot***")
        .to_string();

    sanitized = AUTHORIZATION_HEADER
        .replace_all(&sanitized, "${1}${2} ***")
        .to_string();

    sanitized = SECRET_ASSIGNMENT
        .replace_all(&sanitized, "${1}${2}=***")
        .to_string();

    if sanitized.len() > MAX_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_sanitization() {
        let sanitized = sanitize_error_message("Failed to authenticate: password=secret123 token=abc456");

        assert!(!sanitized.contains("secret123"));
        assert!(!sanitized.contains("abc456"));
        assert!(sanitized.contains("password=***"));
        assert!(sanitized.contains("token=***"));
    }

    #[test]
    fn test_secret_names_inside_words_left_alone() {
        let message = "Lesson: Monkey: intro, hotkey=F5, turnkey:ready";
        assert_eq!(sanitize_error_message(message), message);
    }

    #[test]
    fn test_prefixed_secret_names_redacted() {
        let sanitized = sanitize_error_message("api_key=k-123 access_token: t-456");

        assert_eq!(sanitized, "api_key=*** access_token=***");
    }

    #[test]
    fn test_bot_token_in_url_redacted() {
        let message =
            "error sending request for url (https://api.telegram.org/bot123456:AAH-xyz_987/sendMessage)";
        let sanitized = sanitize_error_message(message);

        assert!(!sanitized.contains("AAH-xyz_987"));
        assert!(sanitized.contains("/bot***/sendMessage"));
    }

    #[test]
    fn test_authorization_header_redacted() {
        let sanitized = sanitize_error_message("rejected Authorization: Token 0123abcd");
        assert!(!sanitized.contains("0123abcd"));
        assert!(sanitized.contains("Token ***"));
    }

    #[test]
    fn test_long_message_truncation() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let sanitized = sanitize_error_message(&"ж".repeat(400));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_sanitize_exactly_500_chars() {
        let sanitized = sanitize_error_message(&"x".repeat(500));
        assert_eq!(sanitized.len(), 500);
        assert!(!sanitized.contains("truncated"));
    }

    #[test]
    fn test_internal_error_constructor() {
        let error = NotifierError::internal_error("unexpected state");
        assert!(matches!(error, NotifierError::InternalError { .. }));
        assert_eq!(error.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_wrapped_errors_keep_their_text() {
        let error = NotifierError::from(PollError::Timeout);
        assert_eq!(error.to_string(), "Review API error: Long poll timed out");

        let error = NotifierError::from(ConfigError::EnvVarNotFound("TG_BOT_TOKEN".into()));
        assert!(error.to_string().contains("TG_BOT_TOKEN"));
    }
}
