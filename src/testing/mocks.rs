//! Mock implementations for testing
//!
//! Provides a scripted [`AttemptSource`] and a recording [`ChatSink`] so the
//! relay loop can be exercised without a network.

use crate::review::{AttemptSource, Cursor, PollError, PollResponse, ReviewAttempt};
use crate::telegram::{ChatError, ChatSink};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

const EXHAUSTED_POLL_DELAY: Duration = Duration::from_millis(1);

pub type SentMessage = (String, String);

/// Source that replays a fixed list of results, then reports timeouts
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<PollResponse, PollError>>>,
    seen_cursors: Mutex<Vec<Option<Cursor>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<PollResponse, PollError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen_cursors: Mutex::new(Vec::new()),
        }
    }

    /// Cursor passed to each fetch, in call order
    pub async fn seen_cursors(&self) -> Vec<Option<Cursor>> {
        self.seen_cursors.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl AttemptSource for ScriptedSource {
    async fn fetch_updates(&self, cursor: Option<&Cursor>) -> Result<PollResponse, PollError> {
        self.seen_cursors.lock().await.push(cursor.cloned());

        let next = self.script.lock().await.pop_front();
        match next {
            Some(result) => result,
            None => {
                // Stand-in for the server holding the request open
                tokio::time::sleep(EXHAUSTED_POLL_DELAY).await;
                Err(PollError::Timeout)
            }
        }
    }
}

/// Chat that records every message it accepts
#[derive(Debug, Default)]
pub struct MockChat {
    sent: Mutex<Vec<SentMessage>>,
    calls: AtomicUsize,
    fail_on_calls: Vec<usize>,
    fail_all: bool,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chat that rejects every message
    pub fn with_failure() -> Self {
        Self {
            fail_all: true,
            ..Default::default()
        }
    }

    /// Chat that rejects the given zero-based calls
    pub fn failing_on(calls: Vec<usize>) -> Self {
        Self {
            fail_on_calls: calls,
            ..Default::default()
        }
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatSink for MockChat {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChatError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_all || self.fail_on_calls.contains(&call) {
            return Err(ChatError::Network("Mock send failure".to_string()));
        }

        self.sent
            .lock()
            .await
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Build a `found` response from `(lesson_title, is_negative, timestamp)` tuples
pub fn found(attempts: &[(&str, bool, &str)], last_attempt_timestamp: &str) -> PollResponse {
    PollResponse::Found {
        new_attempts: attempts
            .iter()
            .map(|(title, is_negative, timestamp)| ReviewAttempt {
                lesson_title: title.to_string(),
                lesson_url: format!("https://dvmn.org/lessons/{}/", title.to_lowercase()),
                is_negative: *is_negative,
                timestamp: Cursor::new(*timestamp),
                submitted_at: None,
            })
            .collect(),
        last_attempt_timestamp: Cursor::new(last_attempt_timestamp),
    }
}
