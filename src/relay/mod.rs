//! The polling loop
//!
//! One [`Relay::tick`] is a single long-polling round trip: fetch with the
//! current cursor, forward every new attempt to the chat, then advance the
//! cursor. Failed fetches leave the cursor untouched and are classified into
//! an immediate retry or a back-off.
//!
//! Delivery is at-most-once. A failed chat send is logged and the cursor moves
//! past the attempt anyway.

pub mod message;

pub use message::format_attempt_message;

use crate::review::{AttemptSource, Cursor, PollError, PollErrorKind, PollResponse};
use crate::telegram::{truncate_for_chat, ChatSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Loop settings
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Chat that receives attempt notifications
    pub chat_id: String,
    /// Pause after a connection failure
    pub connection_retry_delay: Duration,
}

/// Counters kept over the relay's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub polls: u64,
    pub attempts_forwarded: u64,
    pub failed_sends: u64,
    pub timeouts: u64,
    pub connection_errors: u64,
    pub request_errors: u64,
    pub unexpected_errors: u64,
}

pub struct Relay {
    source: Arc<dyn AttemptSource>,
    chat: Arc<dyn ChatSink>,
    settings: RelaySettings,
    cursor: Option<Cursor>,
    connection_failures: u32,
    stats: RelayStats,
}

impl Relay {
    pub fn new(
        source: Arc<dyn AttemptSource>,
        chat: Arc<dyn ChatSink>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            source,
            chat,
            settings,
            cursor: None,
            connection_failures: 0,
            stats: RelayStats::default(),
        }
    }

    /// Cursor that the next request will carry
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Consecutive connection failures since the last successful fetch
    pub fn connection_failures(&self) -> u32 {
        self.connection_failures
    }

    /// Poll forever
    pub async fn run(&mut self) {
        loop {
            if let Some(delay) = self.tick().await {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Run one poll. Returns how long to wait before the next one, if at all.
    pub async fn tick(&mut self) -> Option<Duration> {
        self.stats.polls += 1;

        match self.source.fetch_updates(self.cursor.as_ref()).await {
            Ok(response) => {
                self.connection_failures = 0;
                let next = self.process_updates(&response).await;
                debug!(cursor = %next, "Cursor advanced");
                self.cursor = Some(next);
                None
            }
            Err(error) => self.handle_poll_error(error),
        }
    }

    /// Forward the attempts in `response` and return the cursor to continue from
    pub async fn process_updates(&mut self, response: &PollResponse) -> Cursor {
        for attempt in response.attempts() {
            let text = truncate_for_chat(&format_attempt_message(attempt));

            match self.chat.send_message(&self.settings.chat_id, &text).await {
                Ok(()) => {
                    self.stats.attempts_forwarded += 1;
                    debug!(
                        lesson = %attempt.lesson_title,
                        is_negative = attempt.is_negative,
                        "Review result forwarded"
                    );
                }
                Err(e) => {
                    self.stats.failed_sends += 1;
                    error!(
                        lesson = %attempt.lesson_title,
                        "Failed to forward review result: {}", e
                    );
                }
            }
        }

        response.next_cursor()
    }

    fn handle_poll_error(&mut self, error: PollError) -> Option<Duration> {
        match error.kind() {
            PollErrorKind::Timeout => {
                self.stats.timeouts += 1;
                debug!("Long poll timed out, polling again");
                None
            }
            PollErrorKind::Connection => {
                self.stats.connection_errors += 1;
                self.connection_failures += 1;
                warn!(
                    attempt = self.connection_failures,
                    retry_in_secs = self.settings.connection_retry_delay.as_secs(),
                    "Connection error, attempt {}: {}",
                    self.connection_failures,
                    error
                );
                Some(self.settings.connection_retry_delay)
            }
            PollErrorKind::Request => {
                self.stats.request_errors += 1;
                error!("Long polling request failed: {}", error);
                None
            }
            PollErrorKind::Unexpected => {
                self.stats.unexpected_errors += 1;
                error!(detail = ?error, "Unexpected error while polling: {}", error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::{found, MockChat, ScriptedSource};

    fn settings() -> RelaySettings {
        RelaySettings {
            chat_id: "1001".to_string(),
            connection_retry_delay: Duration::from_secs(10),
        }
    }

    #[tokio::test]
    async fn test_connection_error_backs_off_and_counts_attempts() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(PollError::Connection("refused".into())),
            Err(PollError::Connection("refused".into())),
        ]));
        let chat = Arc::new(MockChat::new());
        let mut relay = Relay::new(source, chat, settings());

        assert_eq!(relay.tick().await, Some(Duration::from_secs(10)));
        assert_eq!(relay.tick().await, Some(Duration::from_secs(10)));
        assert_eq!(relay.connection_failures(), 2);
        assert_eq!(relay.stats().connection_errors, 2);
        assert!(relay.cursor().is_none());
    }

    #[tokio::test]
    async fn test_success_resets_connection_failures() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(PollError::Connection("refused".into())),
            Ok(found(&[("Lesson", false, "10.5")], "10.5")),
        ]));
        let chat = Arc::new(MockChat::new());
        let mut relay = Relay::new(source, chat.clone(), settings());

        relay.tick().await;
        assert_eq!(relay.connection_failures(), 1);

        assert_eq!(relay.tick().await, None);
        assert_eq!(relay.connection_failures(), 0);
        assert_eq!(relay.cursor(), Some(&Cursor::new("10.5")));
        assert_eq!(chat.sent_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_retry_immediately_and_keep_cursor() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(PollResponse::Timeout {
                timestamp_to_request: Cursor::new("7"),
            }),
            Err(PollError::Timeout),
            Err(PollError::Status {
                status: 500,
                body: "oops".into(),
            }),
            Err(PollError::Decode("missing field `status`".into())),
        ]));
        let chat = Arc::new(MockChat::new());
        let mut relay = Relay::new(source, chat, settings());

        for _ in 0..4 {
            assert_eq!(relay.tick().await, None);
        }

        assert_eq!(relay.cursor(), Some(&Cursor::new("7")));
        let stats = relay.stats();
        assert_eq!(stats.polls, 4);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.request_errors, 1);
        assert_eq!(stats.unexpected_errors, 1);
    }
}
