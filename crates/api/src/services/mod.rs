//! External service integrations.

pub mod account_sync;
pub mod email;
pub mod email_templates;
pub mod stripe;

pub use account_sync::AccountSyncService;
pub use email::{EmailError, EmailProvider, EmailService};
pub use stripe::{StripeClient, StripeError};

use tracing::warn;

/// Builds an outbound HTTP client for `service`.
///
/// A builder error falls back to reqwest's defaults, which have no request
/// timeout, so the failure is logged.
pub(crate) fn build_http_client(
    builder: reqwest::ClientBuilder,
    service: &str,
) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            warn!(
                service = service,
                error = %e,
                "HTTP client configuration rejected, using defaults without timeout"
            );
            reqwest::Client::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client_with_valid_builder() {
        let builder = reqwest::Client::builder().timeout(std::time::Duration::from_secs(5));
        let _client = build_http_client(builder, "email");
    }

    #[test]
    fn test_build_http_client_falls_back_on_builder_error() {
        // A header value with a newline is rejected when the client is built.
        let builder = reqwest::Client::builder().user_agent("bad\nagent");
        assert!(reqwest::Client::builder()
            .user_agent("bad\nagent")
            .build()
            .is_err());
        let _client = build_http_client(builder, "stripe");
    }
}
