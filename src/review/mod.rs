//! Review API access
//!
//! The relay only depends on [`AttemptSource`]; [`ReviewApiClient`] is the
//! HTTP implementation and tests swap in scripted sources.

use async_trait::async_trait;
use thiserror::Error;

pub mod client;
pub mod types;

pub use client::{ReviewApiClient, ReviewApiConfig};
pub use types::{Cursor, PollResponse, ReviewAttempt};

/// Failure of a single long-polling request
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PollError {
    #[error("Long poll timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Review API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// How the polling loop should react to a [`PollError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollErrorKind {
    /// The server held the request past the client timeout
    Timeout,
    /// The endpoint could not be reached; back off before retrying
    Connection,
    /// Any other request-level failure
    Request,
    /// The response could not be understood
    Unexpected,
}

impl PollError {
    pub fn kind(&self) -> PollErrorKind {
        match self {
            PollError::Timeout => PollErrorKind::Timeout,
            PollError::Connection(_) => PollErrorKind::Connection,
            PollError::Status { .. } | PollError::Request(_) => PollErrorKind::Request,
            PollError::Decode(_) => PollErrorKind::Unexpected,
        }
    }
}

/// Source of review attempts, consumed by the relay loop
#[async_trait]
pub trait AttemptSource: Send + Sync {
    /// Wait for new attempts after `cursor`, or from "now" when no cursor is known
    async fn fetch_updates(&self, cursor: Option<&Cursor>) -> Result<PollResponse, PollError>;
}
