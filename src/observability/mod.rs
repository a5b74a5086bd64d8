//! Observability: console logging and chat log routing

pub mod chat_log;
pub mod logging;

pub use chat_log::{chat_log_channel, ChatLogForwarder, ChatLogHandle, ChatLogLayer};
pub use logging::{init_default_logging, init_logging, LogFormat};
