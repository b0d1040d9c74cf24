//! Email delivery for transactional mail and notification alerts.
//!
//! Supported providers:
//! - `console`: Logs emails (development, and demo mode when SendGrid has no key)
//! - `sendgrid`: Sends via the SendGrid v3 API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use domain::models::email::AlertData;
use domain::models::{DeliveryChannel, EmailMessage, Notification, RenderedEmail, UserContact};
use domain::services::{DeliveryResult, NotificationChannel};

use super::email_templates;
use crate::config::EmailConfig;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    Console,
    SendGrid,
}

impl EmailProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailProvider::Console => "console",
            EmailProvider::SendGrid => "sendgrid",
        }
    }
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    provider: EmailProvider,
    client: reqwest::Client,
}

impl EmailService {
    /// Creates a new EmailService. The provider is fixed here: `sendgrid`
    /// without an API key runs in demo mode and only logs.
    pub fn new(config: EmailConfig) -> Self {
        let provider = match config.provider.as_str() {
            "sendgrid" if config.sendgrid_api_key.trim().is_empty() => {
                warn!("SendGrid API key missing, emails will be logged only (demo mode)");
                EmailProvider::Console
            }
            "sendgrid" => EmailProvider::SendGrid,
            _ => EmailProvider::Console,
        };

        let client = super::build_http_client(
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)),
            "email",
        );

        Self {
            config: Arc::new(config),
            provider,
            client,
        }
    }

    pub fn provider(&self) -> EmailProvider {
        self.provider
    }

    /// Renders a message with links pointing at the configured frontend.
    pub fn render(&self, message: &EmailMessage, user_name: &str) -> RenderedEmail {
        email_templates::render(message, user_name, &self.config.frontend_url)
    }

    /// Sends a rendered email.
    pub async fn send(
        &self,
        to: &str,
        to_name: Option<&str>,
        email: &RenderedEmail,
    ) -> Result<(), EmailError> {
        if !is_plausible_address(to) {
            return Err(EmailError::InvalidAddress(to.to_string()));
        }

        match self.provider {
            EmailProvider::Console => {
                self.send_console(to, email);
                Ok(())
            }
            EmailProvider::SendGrid => self.send_sendgrid(to, to_name, email).await,
        }
    }

    fn send_console(&self, to: &str, email: &RenderedEmail) {
        info!(
            to = %to,
            from = %self.config.sender_email,
            subject = %email.subject,
            "Email (console provider)"
        );
        info!(body = %email.text, "Email body");
    }

    async fn send_sendgrid(
        &self,
        to: &str,
        to_name: Option<&str>,
        email: &RenderedEmail,
    ) -> Result<(), EmailError> {
        let mut recipient = serde_json::json!({ "email": to });
        if let Some(name) = to_name {
            recipient["name"] = serde_json::json!(name);
        }

        let body = serde_json::json!({
            "personalizations": [{ "to": [recipient] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": email.subject,
            "content": [
                { "type": "text/plain", "value": email.text },
                { "type": "text/html", "value": email.html }
            ]
        });

        let response = self
            .client
            .post(format!(
                "{}/mail/send",
                self.config.api_base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %to, subject = %email.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

fn is_plausible_address(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

#[async_trait]
impl NotificationChannel for EmailService {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn deliver(&self, recipient: &UserContact, notification: &Notification) -> DeliveryResult {
        let Some(address) = recipient.email.as_deref() else {
            return DeliveryResult::NoRecipient;
        };

        let message = EmailMessage::Alert(AlertData {
            title: notification.title.clone(),
            message: notification.message.clone(),
        });
        let name = recipient.greeting_name();
        let rendered = self.render(&message, &name);

        let started = Utc::now();
        match self.send(address, Some(&name), &rendered).await {
            Ok(()) => DeliveryResult::Sent,
            Err(e) => {
                warn!(
                    notification_id = %notification.id,
                    user_id = %recipient.id,
                    elapsed_ms = (Utc::now() - started).num_milliseconds(),
                    error = %e,
                    "Notification email failed"
                );
                DeliveryResult::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::notification::{NewNotification, NotificationMetadata};
    use domain::models::{NotificationPriority, NotificationType};
    use uuid::Uuid;

    fn test_config() -> EmailConfig {
        EmailConfig {
            provider: "console".to_string(),
            sender_email: "test@example.com".to_string(),
            sender_name: "Test".to_string(),
            frontend_url: "https://app.example.com".to_string(),
            ..EmailConfig::default()
        }
    }

    fn contact(email: Option<&str>) -> UserContact {
        UserContact {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            display_name: Some("Sam".to_string()),
        }
    }

    fn notification() -> Notification {
        NewNotification {
            user_id: Uuid::new_v4(),
            notification_type: NotificationType::LowBalance,
            title: "Low Balance Alert - Checking".to_string(),
            message: "Your Checking balance is $50.00".to_string(),
            priority: NotificationPriority::High,
            metadata: NotificationMetadata::empty(),
            related_account_id: None,
            related_transaction_id: None,
            created_at: Utc::now(),
        }
        .into_notification(Uuid::new_v4())
    }

    #[test]
    fn test_console_provider_by_default() {
        let service = EmailService::new(test_config());
        assert_eq!(service.provider(), EmailProvider::Console);
    }

    #[test]
    fn test_sendgrid_without_key_is_demo_mode() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);
        assert_eq!(service.provider(), EmailProvider::Console);
    }

    #[test]
    fn test_sendgrid_with_key() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        config.sendgrid_api_key = "SG.key".to_string();
        let service = EmailService::new(config);
        assert_eq!(service.provider(), EmailProvider::SendGrid);
    }

    #[test]
    fn test_render_uses_frontend_url() {
        let service = EmailService::new(test_config());
        let email = service.render(&EmailMessage::Generic, "Sam");
        assert_eq!(email.subject, "SmartSaver Notification");

        let alert = service.render(
            &EmailMessage::Alert(AlertData {
                title: "Heads up".to_string(),
                message: "Something happened".to_string(),
            }),
            "Sam",
        );
        assert!(alert.html.contains("https://app.example.com/notifications"));
    }

    #[tokio::test]
    async fn test_send_console_email() {
        let service = EmailService::new(test_config());
        let email = service.render(&EmailMessage::Generic, "Sam");
        let result = service.send("user@example.com", Some("Sam"), &email).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_address() {
        let service = EmailService::new(test_config());
        let email = service.render(&EmailMessage::Generic, "Sam");
        let result = service.send("not-an-address", None, &email).await;
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_deliver_without_email_address() {
        let service = EmailService::new(test_config());
        let result = service.deliver(&contact(None), &notification()).await;
        assert_eq!(result, DeliveryResult::NoRecipient);
    }

    #[tokio::test]
    async fn test_deliver_via_console() {
        let service = EmailService::new(test_config());
        assert_eq!(service.channel(), DeliveryChannel::Email);
        let result = service
            .deliver(&contact(Some("sam@example.com")), &notification())
            .await;
        assert_eq!(result, DeliveryResult::Sent);
    }
}
