//! Structured logging system using tracing crate
//!
//! Console output plus, optionally, the chat log layer.
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: Log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: Output format (json, pretty, compact) - defaults to json
//! - `LOG_SPANS`: Include span events (true/false) - defaults to false
//! - `RUST_LOG`: Override console filtering (follows env_logger format)
//!
//! The console filter does not apply to the chat layer, which has its own
//! level from the `[telegram]` config section.
//!
//! ```bash
//! LOG_FORMAT=pretty LOG_LEVEL=DEBUG ./review-notifier run
//! ```

use crate::config::parse_level;
use crate::observability::chat_log::ChatLogLayer;
use std::env;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// JSON format for structured logging (machine-readable)
    Json,
    /// Pretty format with colors and indentation (human-readable)
    Pretty,
    /// Compact format with colors but minimal spacing (terminal-friendly)
    Compact,
}

impl LogFormat {
    /// Parse log format from string
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Console level from `-v` count, falling back to `LOG_LEVEL`
pub fn resolve_level(verbosity: u8, log_level_env: Option<&str>) -> Level {
    match verbosity {
        0 => log_level_env.and_then(parse_level).unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn console_filter(level: Level) -> EnvFilter {
    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }

    EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,tokio=warn"))
}

/// Initialize logging with manual configuration
pub fn init_logging(
    level: Level,
    format: LogFormat,
    include_spans: bool,
    chat_layer: Option<ChatLogLayer>,
) {
    let filter = console_filter(level);
    let span_events = if include_spans {
        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
    } else {
        fmt::format::FmtSpan::NONE
    };

    let subscriber = tracing_subscriber::registry().with(chat_layer);

    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_span_events(span_events)
                .with_filter(filter);
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_ansi(true)
                .with_span_events(span_events)
                .with_filter(filter);
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(true)
                .with_target(false)
                .with_span_events(span_events)
                .with_filter(filter);
            subscriber.with(fmt_layer).init();
        }
    }
}

/// Initialize logging from environment variables
pub fn init_default_logging(verbosity: u8, chat_layer: Option<ChatLogLayer>) {
    let log_level = env::var("LOG_LEVEL").ok();
    let level = resolve_level(verbosity, log_level.as_deref());

    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let log_format = LogFormat::parse(&format);

    let include_spans = env::var("LOG_SPANS")
        .unwrap_or_else(|_| "false".to_string())
        .to_lowercase()
        == "true";

    init_logging(level, log_format, include_spans, chat_layer);
}
