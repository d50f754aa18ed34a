//! Direct-message sink: forwards log lines to a chat recipient.
//!
//! The chat platform itself is an external collaborator reached through the
//! [`DirectMessenger`] trait; this sink only does the tagging and the
//! echo suppression that keeps relayed direct messages from bouncing back
//! to their author.

use std::sync::Arc;

use crate::clock;
use crate::sink::{LogCategory, LogSink};

/// Errors from delivering a direct message.
#[derive(Debug)]
pub enum DeliveryError {
    /// No direct channel exists for the recipient. A normal outcome while
    /// the chat client is still logging in, not an exception.
    ChannelNotFound,
    /// The platform rejected the send.
    Send(String),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::ChannelNotFound => write!(f, "direct channel not found"),
            DeliveryError::Send(msg) => write!(f, "direct send failed: {msg}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Boundary to the chat platform. Implementations are expected to deliver
/// asynchronously and must not block the caller on network round-trips.
pub trait DirectMessenger: Send + Sync {
    fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Forwards every write to a configured recipient, tagged with time and
/// category.
pub struct DirectMessageSink {
    recipient: String,
    own_name: String,
    messenger: Arc<dyn DirectMessenger>,
}

impl DirectMessageSink {
    pub fn new(
        recipient: impl Into<String>,
        own_name: impl Into<String>,
        messenger: Arc<dyn DirectMessenger>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            own_name: own_name.into(),
            messenger,
        }
    }

    /// Sender of a relayed direct message: the text before the first colon.
    fn embedded_sender(message: &str) -> &str {
        message.split(':').next().unwrap_or("").trim()
    }

    fn is_echo(&self, message: &str) -> bool {
        let sender = Self::embedded_sender(message).to_lowercase();
        sender == self.recipient.to_lowercase() || sender == self.own_name.to_lowercase()
    }
}

impl LogSink for DirectMessageSink {
    fn write(&self, category: LogCategory, message: &str) {
        // Relaying the recipient's own messages (or our own) back at them
        // would loop forever.
        if category == LogCategory::DirectMessage && self.is_echo(message) {
            return;
        }

        let text = format!("[{} | {}]: {}", clock::current_time(), category, message);
        if let Err(e) = self.messenger.send(&self.recipient, &text) {
            tracing::warn!(%category, "direct message delivery failed: {e}");
        }
    }
}
