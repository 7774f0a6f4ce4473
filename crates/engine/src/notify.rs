//! Notification port.
//!
//! Dispatch is fire-and-forget: the engine logs a failed dispatch and
//! carries on, the committed transition stays in place.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use vetted_core::workflow::Notification;

/// Failure reported by a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport refused or dropped the message.
    #[error("Failed to deliver {template}: {reason}")]
    Delivery {
        /// Template name.
        template: String,
        /// Transport-specific reason.
        reason: String,
    },
}

/// Notification collaborator of the workflow engine.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatches one notification.
    async fn dispatch(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes every notification to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn dispatch(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            template = %notification.template,
            entity = %notification.entity,
            recipient = notification.recipient.as_deref().unwrap_or("-"),
            payload = %notification.payload,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Keeps dispatched notifications in memory.
///
/// A failing recorder still records each attempt, then reports a delivery
/// error.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: bool,
}

impl RecordingNotifier {
    /// Creates a recorder that accepts every notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that fails every dispatch.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            failing: true,
        }
    }

    /// Returns every notification seen so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, notification: &Notification) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        if self.failing {
            return Err(NotifyError::Delivery {
                template: notification.template.to_string(),
                reason: "transport unavailable".into(),
            });
        }
        Ok(())
    }
}
