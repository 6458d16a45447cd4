//! User-visible failure notifications.
//!
//! The core has no automatic retries; every terminal failure is surfaced
//! to the UI layer through an injected [`Notifier`]. Diagnostics go to
//! `tracing` separately.

use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Sink for short, user-facing status messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Forwards notifications to a `tracing` warning. Useful for headless
/// embedders that have no notification surface.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Queues notifications on an unbounded channel for a UI to drain.
pub struct ChannelNotifier {
    tx: UnboundedSender<String>,
}

impl ChannelNotifier {
    /// Creates the notifier and the receiving end for the UI.
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str) {
        // A closed receiver means the UI is gone; nothing left to tell.
        let _ = self.tx.send(message.to_string());
    }
}

/// Records notifications in memory. Intended for tests.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Whether any received message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
