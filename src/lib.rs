//! Review Notifier
//!
//! Long-polls a code review service for new review results and forwards each
//! one to a Telegram chat. The notifier's own log lines go to the same chat.
//!
//! # Overview
//!
//! - [`review`]: the long-polling API client and its wire types
//! - [`telegram`]: the chat client
//! - [`relay`]: the polling loop that ties them together
//! - [`observability`]: console logging and chat log routing
//!
//! # Quick Start
//!
//! ```rust
//! use review_notifier::relay::format_attempt_message;
//! use review_notifier::review::PollResponse;
//!
//! let body = r#"{
//!     "status": "found",
//!     "new_attempts": [{
//!         "lesson_title": "Bots",
//!         "lesson_url": "https://dvmn.org/lessons/bots/",
//!         "is_negative": false,
//!         "timestamp": 1555493856.28
//!     }],
//!     "last_attempt_timestamp": 1555493856.28
//! }"#;
//!
//! let response: PollResponse = serde_json::from_str(body).unwrap();
//! assert_eq!(response.next_cursor().as_str(), "1555493856.28");
//!
//! let text = format_attempt_message(&response.attempts()[0]);
//! assert!(text.contains("Урок: Bots"));
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod relay;
pub mod review;
pub mod telegram;
pub mod testing;

pub use config::{ConfigError, NotifierConfig};
pub use error::{NotifierError, NotifierResult};
pub use relay::{Relay, RelaySettings, RelayStats};
pub use review::{AttemptSource, Cursor, PollError, PollResponse, ReviewApiClient, ReviewAttempt};
pub use telegram::{ChatError, ChatSink, TelegramBot};
