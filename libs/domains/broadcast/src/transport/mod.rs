//! Mail transport implementations

pub mod mock;
pub mod smtp;

pub use mock::MockTransport;
pub use smtp::{SmtpConfig, SmtpSecurity, SmtpTransport};

use async_trait::async_trait;
use domain_subscribers::Recipient;

use crate::error::TransportError;
use crate::message::RenderedMessage;

/// One fully rendered message addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl OutboundMail {
    pub fn new(recipient: &Recipient, message: RenderedMessage) -> Self {
        Self {
            to_email: recipient.email.clone(),
            to_name: recipient.name.clone(),
            subject: message.subject,
            html_body: message.html_body,
            text_body: message.text_body,
        }
    }
}

/// Hands a rendered message to an external mail system.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send one message; the error's display text is recorded as the failure cause
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError>;

    /// Short transport name used in delivery log entries
    fn name(&self) -> &'static str;
}
