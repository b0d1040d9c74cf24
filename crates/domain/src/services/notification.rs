//! Notification delivery channels.
//!
//! In-app delivery is the notification row itself. Every other channel
//! implements [`NotificationChannel`] and is invoked best-effort after the row
//! is written.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::models::{DeliveryChannel, Notification, UserContact};

/// Result of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// Delivered (or accepted by the provider).
    Sent,
    /// User has no address for this channel.
    NoRecipient,
    /// Delivery failed; the notification row is kept.
    Failed(String),
    /// Channel disabled for this user or notification.
    Skipped,
}

impl DeliveryResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryResult::Sent)
    }

    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryResult::Sent => "sent",
            DeliveryResult::NoRecipient => "no_recipient",
            DeliveryResult::Failed(_) => "failed",
            DeliveryResult::Skipped => "skipped",
        }
    }
}

/// A channel that can deliver a stored notification to a user.
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Which delivery flag this channel sets on success.
    fn channel(&self) -> DeliveryChannel;

    /// Deliver `notification` to `recipient`.
    async fn deliver(&self, recipient: &UserContact, notification: &Notification)
        -> DeliveryResult;
}

/// Mock email channel for development and testing.
///
/// Logs notifications but doesn't actually send them.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationChannel {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Arc<AtomicUsize>,
}

impl MockNotificationChannel {
    /// Create a new mock channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock channel that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Number of successful deliveries so far.
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NotificationChannel for MockNotificationChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn deliver(
        &self,
        recipient: &UserContact,
        notification: &Notification,
    ) -> DeliveryResult {
        let Some(email) = recipient.email.as_deref() else {
            return DeliveryResult::NoRecipient;
        };

        if self.simulate_failure {
            tracing::warn!(
                notification_id = %notification.id,
                recipient = %email,
                "Mock notification channel simulating failure"
            );
            return DeliveryResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            notification_id = %notification.id,
            notification_type = %notification.notification_type,
            recipient = %email,
            "Mock: Would send notification email"
        );
        self.sent.fetch_add(1, Ordering::SeqCst);

        DeliveryResult::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewNotification, NotificationMetadata, NotificationPriority, NotificationType};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_notification() -> Notification {
        NewNotification {
            user_id: Uuid::new_v4(),
            notification_type: NotificationType::SecurityAlert,
            title: "Security".to_string(),
            message: "2FA enabled".to_string(),
            priority: NotificationPriority::Low,
            metadata: NotificationMetadata::empty(),
            related_account_id: None,
            related_transaction_id: None,
            created_at: Utc::now(),
        }
        .into_notification(Uuid::new_v4())
    }

    fn contact(email: Option<&str>) -> UserContact {
        UserContact {
            id: Uuid::new_v4(),
            email: email.map(|e| e.to_string()),
            display_name: None,
        }
    }

    #[test]
    fn test_delivery_result_labels() {
        assert_eq!(DeliveryResult::Sent.as_str(), "sent");
        assert_eq!(DeliveryResult::Failed("x".into()).as_str(), "failed");
        assert!(DeliveryResult::Sent.is_sent());
        assert!(!DeliveryResult::Skipped.is_sent());
    }

    #[tokio::test]
    async fn test_mock_channel_send() {
        let channel = MockNotificationChannel::new();
        let result = channel
            .deliver(&contact(Some("saver@example.com")), &sample_notification())
            .await;
        assert_eq!(result, DeliveryResult::Sent);
        assert_eq!(channel.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_channel_failure() {
        let channel = MockNotificationChannel::failing();
        let result = channel
            .deliver(&contact(Some("saver@example.com")), &sample_notification())
            .await;
        assert!(matches!(result, DeliveryResult::Failed(_)));
        assert_eq!(channel.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_channel_without_address() {
        let channel = MockNotificationChannel::new();
        let result = channel.deliver(&contact(None), &sample_notification()).await;
        assert_eq!(result, DeliveryResult::NoRecipient);
    }

    #[tokio::test]
    async fn test_clones_share_counter() {
        let channel = MockNotificationChannel::new();
        let clone = channel.clone();
        clone
            .deliver(&contact(Some("a@example.com")), &sample_notification())
            .await;
        assert_eq!(channel.sent_count(), 1);
    }
}
