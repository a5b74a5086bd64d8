//! Routes the notifier's own log lines to the chat
//!
//! [`ChatLogLayer`] sits in the `tracing` subscriber next to the console
//! output. It formats matching events and queues them on a bounded channel; a
//! [`ChatLogForwarder`] task drains the channel in order and posts each line.
//!
//! The layer never blocks the code that logs. When the queue is full the line
//! is dropped and counted, and the forwarder posts one summary line for the
//! drops once it has caught up.
//!
//! Only events from this crate are forwarded, and never those from the chat
//! client module, so delivering a line cannot produce another line. Failures
//! to deliver are logged under [`FORWARDER_TARGET`], which is outside the
//! crate and therefore stays local.

use crate::error::sanitize_error_message;
use crate::telegram::ChatSink;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, oneshot};
use tracing::field::{Field, Visit};
use tracing::{warn, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Target used for the forwarder's own diagnostics
pub const FORWARDER_TARGET: &str = "chat_log_forwarder";

/// Lines that may wait for delivery before new ones are dropped
pub const CHAT_LOG_QUEUE_CAPACITY: usize = 100;

const CRATE_TARGET: &str = "review_notifier";
const CHAT_CLIENT_TARGET: &str = "review_notifier::telegram";

enum ChatLogCommand {
    Line(String),
    Flush(oneshot::Sender<()>),
}

/// Subscriber layer that queues log lines for the chat
pub struct ChatLogLayer {
    sender: mpsc::Sender<ChatLogCommand>,
    dropped: Arc<AtomicU64>,
    max_level: Level,
}

/// Handle for waiting on queued lines
#[derive(Clone)]
pub struct ChatLogHandle {
    sender: mpsc::Sender<ChatLogCommand>,
}

/// Background task that delivers queued lines
pub struct ChatLogForwarder {
    receiver: mpsc::Receiver<ChatLogCommand>,
    dropped: Arc<AtomicU64>,
    chat: Arc<dyn ChatSink>,
    chat_id: String,
}

/// Build the three connected halves of chat log routing.
///
/// Events more verbose than `max_level` are dropped by the layer.
pub fn chat_log_channel(
    chat: Arc<dyn ChatSink>,
    chat_id: String,
    max_level: Level,
) -> (ChatLogLayer, ChatLogHandle, ChatLogForwarder) {
    let (sender, receiver) = mpsc::channel(CHAT_LOG_QUEUE_CAPACITY);
    let dropped = Arc::new(AtomicU64::new(0));

    (
        ChatLogLayer {
            sender: sender.clone(),
            dropped: dropped.clone(),
            max_level,
        },
        ChatLogHandle { sender },
        ChatLogForwarder {
            receiver,
            dropped,
            chat,
            chat_id,
        },
    )
}

/// Whether events from `target` may be sent to the chat
pub fn is_forwardable(target: &str) -> bool {
    let in_crate = target == CRATE_TARGET
        || target
            .strip_prefix(CRATE_TARGET)
            .is_some_and(|rest| rest.starts_with("::"));

    in_crate && !target.starts_with(CHAT_CLIENT_TARGET)
}

/// Render an event as one chat line (pure)
fn format_line(level: &Level, message: &str, fields: &[String]) -> String {
    let mut line = format!("[{level}] {message}");
    if !fields.is_empty() {
        line.push_str(" (");
        line.push_str(&fields.join(", "));
        line.push(')');
    }
    sanitize_error_message(&line)
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

impl<S: Subscriber> Layer<S> for ChatLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.max_level || !is_forwardable(metadata.target()) {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = format_line(metadata.level(), &visitor.message, &visitor.fields);
        match self.sender.try_send(ChatLogCommand::Line(line)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            // Forwarder gone means shutdown; console output still has the line.
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

impl ChatLogHandle {
    /// Wait until every line queued before this call has been handled.
    ///
    /// Returns false when the forwarder is no longer running.
    pub async fn flush(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.sender.send(ChatLogCommand::Flush(ack)).await.is_err() {
            return false;
        }
        done.await.is_ok()
    }
}

impl ChatLogForwarder {
    pub async fn run(mut self) {
        loop {
            let command = match self.receiver.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => {
                    // Caught up: anything dropped is newer than what was sent.
                    self.report_dropped().await;
                    match self.receiver.recv().await {
                        Some(command) => command,
                        None => break,
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            };

            match command {
                ChatLogCommand::Line(text) => self.deliver(&text).await,
                ChatLogCommand::Flush(ack) => {
                    self.report_dropped().await;
                    let _ = ack.send(());
                }
            }
        }
    }

    async fn report_dropped(&self) {
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            self.deliver(&dropped_notice(dropped)).await;
        }
    }

    async fn deliver(&self, text: &str) {
        if let Err(e) = self.chat.send_message(&self.chat_id, text).await {
            warn!(target: FORWARDER_TARGET, "Failed to send log line to chat: {}", e);
        }
    }
}

fn dropped_notice(count: u64) -> String {
    format!("[WARN] {count} log lines dropped, chat delivery fell behind")
}
