// src/core/notify.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::llm::FailureReason;

/// Classified failure event for user display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub reason: FailureReason,
    pub provider: String,
    pub detail: String,
    pub remediation: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(reason: FailureReason, provider: &str, detail: &str) -> Self {
        Self {
            reason,
            provider: provider.to_string(),
            detail: detail.to_string(),
            remediation: reason.remediation().to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Where classified failures go. Pushing must never block the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        warn!(
            "{} augmentation failed ({}): {}. {}",
            notification.provider, notification.reason, notification.detail, notification.remediation
        );
    }
}

/// Forwards notifications to a host over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            debug!("Notification dropped: receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_without_blocking() {
        let (sink, mut receiver) = ChannelSink::new();
        sink.notify(Notification::new(FailureReason::RateLimit, "openai", "HTTP 429"));

        let received = receiver.try_recv().unwrap();
        assert_eq!(received.reason, FailureReason::RateLimit);
        assert_eq!(received.remediation, FailureReason::RateLimit.remediation());
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (sink, receiver) = ChannelSink::new();
        drop(receiver);
        sink.notify(Notification::new(FailureReason::Generic, "openai", "gone"));
    }
}
