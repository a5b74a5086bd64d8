//! Wire types of the review long-polling API

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque continuation token.
///
/// The API hands out timestamps as JSON numbers (sometimes strings). The value
/// is kept as rendered so it can be echoed back unchanged. Floats with no
/// fractional part keep their trailing `.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct CursorVisitor;

impl<'de> Visitor<'de> for CursorVisitor {
    type Value = Cursor;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a timestamp as a number or string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cursor, E> {
        Ok(Cursor(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cursor, E> {
        Ok(Cursor(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Cursor, E> {
        if !v.is_finite() {
            return Err(E::custom("timestamp must be finite"));
        }
        Ok(Cursor(render_float(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Cursor, E> {
        if v.trim().is_empty() {
            return Err(E::custom("timestamp must not be empty"));
        }
        Ok(Cursor(v.to_string()))
    }
}

fn render_float(v: f64) -> String {
    let rendered = v.to_string();
    if rendered.contains(['.', 'e', 'E']) {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CursorVisitor)
    }
}

/// A single reviewed submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAttempt {
    pub lesson_title: String,
    pub lesson_url: String,
    /// True when the reviewer sent the work back
    pub is_negative: bool,
    pub timestamp: Cursor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}

/// Result of one long-polling request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollResponse {
    /// New attempts arrived before the server-side timeout
    Found {
        new_attempts: Vec<ReviewAttempt>,
        last_attempt_timestamp: Cursor,
    },
    /// Nothing new; resume from the given timestamp
    Timeout { timestamp_to_request: Cursor },
}

impl PollResponse {
    /// Cursor to send with the next request
    pub fn next_cursor(&self) -> Cursor {
        match self {
            PollResponse::Found {
                new_attempts,
                last_attempt_timestamp,
            } => new_attempts
                .last()
                .map(|attempt| attempt.timestamp.clone())
                .unwrap_or_else(|| last_attempt_timestamp.clone()),
            PollResponse::Timeout {
                timestamp_to_request,
            } => timestamp_to_request.clone(),
        }
    }

    pub fn attempts(&self) -> &[ReviewAttempt] {
        match self {
            PollResponse::Found { new_attempts, .. } => new_attempts,
            PollResponse::Timeout { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_found_response_parses_and_ignores_request_query() {
        let body = json!({
            "status": "found",
            "new_attempts": [
                {
                    "submitted_at": "2019-04-17T12:37:26.654893+03:00",
                    "timestamp": 1555493846.654893,
                    "is_negative": true,
                    "lesson_title": "Отправляем уведомления",
                    "lesson_url": "https://dvmn.org/modules/chat-bots/lesson/devman-bot/"
                }
            ],
            "last_attempt_timestamp": 1555493846.654893,
            "request_query": [["timestamp", "1555493800"]]
        });

        let response: PollResponse = serde_json::from_value(body).unwrap();
        let attempts = response.attempts();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].is_negative);
        assert_eq!(
            attempts[0].submitted_at.as_deref(),
            Some("2019-04-17T12:37:26.654893+03:00")
        );
        assert_eq!(response.next_cursor().as_str(), "1555493846.654893");
    }

    #[test]
    fn test_next_cursor_takes_last_attempt() {
        let body = json!({
            "status": "found",
            "new_attempts": [
                {"timestamp": 100.5, "is_negative": false, "lesson_title": "a", "lesson_url": "u1"},
                {"timestamp": 200.25, "is_negative": true, "lesson_title": "b", "lesson_url": "u2"}
            ],
            "last_attempt_timestamp": 150
        });

        let response: PollResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.next_cursor(), Cursor::new("200.25"));
    }

    #[test]
    fn test_next_cursor_falls_back_when_found_is_empty() {
        let body = json!({
            "status": "found",
            "new_attempts": [],
            "last_attempt_timestamp": 1555493856
        });

        let response: PollResponse = serde_json::from_value(body).unwrap();
        assert!(response.attempts().is_empty());
        assert_eq!(response.next_cursor(), Cursor::new("1555493856"));
    }

    #[test]
    fn test_timeout_response_uses_timestamp_to_request() {
        let body = json!({
            "status": "timeout",
            "timestamp_to_request": 1555493856.2806218,
            "request_query": []
        });

        let response: PollResponse = serde_json::from_value(body).unwrap();
        assert!(response.attempts().is_empty());
        assert_eq!(response.next_cursor().as_str(), "1555493856.2806218");
    }

    #[test]
    fn test_integral_float_cursor_keeps_fraction() {
        let body = json!({"status": "timeout", "timestamp_to_request": 1555493900.0});
        let response: PollResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.next_cursor().as_str(), "1555493900.0");

        let body = json!({"status": "timeout", "timestamp_to_request": 1555493900});
        let response: PollResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.next_cursor().as_str(), "1555493900");
    }

    #[test]
    fn test_string_cursor_kept_verbatim() {
        let body = json!({"status": "timeout", "timestamp_to_request": "1555493856.280"});
        let response: PollResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.next_cursor().as_str(), "1555493856.280");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let body = json!({"status": "error", "detail": "Invalid token."});
        assert!(serde_json::from_value::<PollResponse>(body).is_err());
    }

    #[test]
    fn test_empty_string_cursor_rejected() {
        let body = json!({"status": "timeout", "timestamp_to_request": ""});
        assert!(serde_json::from_value::<PollResponse>(body).is_err());
    }
}
