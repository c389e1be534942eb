//! Feedback channel
//!
//! The controller never renders anything. It publishes one [`FeedbackEvent`]
//! per finished operation and whoever holds the receiver (toast layer, CLI)
//! decides how to show it.

use ridebook_core::{AppError, ErrorMetadata};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Error,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Success => "success",
            FeedbackKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEvent {
    pub kind: FeedbackKind,
    pub message: String,
    /// Machine code of the error, for error events
    pub error_code: Option<&'static str>,
}

impl FeedbackEvent {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Success,
            message: message.into(),
            error_code: None,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            kind: FeedbackKind::Error,
            message: err.client_message(),
            error_code: Some(err.error_code()),
        }
    }
}

pub type FeedbackReceiver = mpsc::UnboundedReceiver<FeedbackEvent>;

#[derive(Debug, Clone)]
pub struct FeedbackPublisher {
    tx: mpsc::UnboundedSender<FeedbackEvent>,
}

impl FeedbackPublisher {
    pub fn channel() -> (Self, FeedbackReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event. A dropped receiver is not an error for the caller.
    pub fn publish(&self, event: FeedbackEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Feedback receiver dropped; event discarded");
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(FeedbackEvent::success(message));
    }

    pub fn error(&self, err: &AppError) {
        self.publish(FeedbackEvent::error(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_event_uses_client_message_and_code() {
        let (publisher, mut rx) = FeedbackPublisher::channel();
        publisher.error(&AppError::Conflict(
            "A driver with license number AB123 already exists".to_string(),
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, FeedbackKind::Error);
        assert_eq!(event.error_code, Some("CONFLICT"));
        assert!(event.message.contains("AB123"));
    }

    #[test]
    fn test_publish_after_receiver_dropped_is_silent() {
        let (publisher, rx) = FeedbackPublisher::channel();
        drop(rx);
        publisher.success("Driver created");
    }
}
