//! Mock mail transport for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{MailTransport, OutboundMail};
use crate::error::TransportError;

/// Captures accepted mail and fails for configured addresses.
///
/// Clones share the captured list, so a test can keep one handle while the
/// dispatcher owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<OutboundMail>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    failures: HashMap<String, String>,
    send_delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message to `email` with `cause`
    pub fn failing_for(mut self, email: impl Into<String>, cause: impl Into<String>) -> Self {
        self.failures.insert(email.into(), cause.into());
        self
    }

    /// Sleep for `delay` inside every send
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Messages accepted so far, in send order
    pub async fn sent_emails(&self) -> Vec<OutboundMail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Every address a send was attempted for, including rejected ones
    pub async fn attempts(&self) -> Vec<String> {
        self.attempts.lock().await.clone()
    }

    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.sent.lock().await.iter().any(|m| m.to_email == email)
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
        self.attempts.lock().await.push(mail.to_email.clone());

        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(cause) = self.failures.get(&mail.to_email) {
            return Err(TransportError::Rejected(cause.clone()));
        }

        self.sent.lock().await.push(mail.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &str) -> OutboundMail {
        OutboundMail {
            to_email: to.to_string(),
            to_name: String::new(),
            subject: "Test".to_string(),
            html_body: "<p>Body</p>".to_string(),
            text_body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_transport_records_sends() {
        let transport = MockTransport::new();
        let handle = transport.clone();

        transport.send(&mail("user@example.com")).await.unwrap();

        assert_eq!(handle.sent_count().await, 1);
        assert!(handle.was_sent_to("user@example.com").await);
        assert!(!handle.was_sent_to("other@example.com").await);
    }

    #[tokio::test]
    async fn test_mock_transport_fails_for_configured_address() {
        let transport = MockTransport::new().failing_for("b@x.com", "mailbox unavailable");

        assert!(transport.send(&mail("a@x.com")).await.is_ok());
        let err = transport.send(&mail("b@x.com")).await.unwrap_err();

        assert_eq!(err.to_string(), "mailbox unavailable");
        assert_eq!(transport.sent_count().await, 1);
        assert_eq!(transport.attempts().await, vec!["a@x.com", "b@x.com"]);
    }
}
