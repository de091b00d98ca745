//! SMTP mail transport using lettre

use async_trait::async_trait;
use core_config::{env_optional, env_or_default, env_parse, env_required, ConfigError, FromEnv};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::fmt;
use std::str::FromStr;

use super::{MailTransport, OutboundMail};
use crate::error::TransportError;

/// Connection security for the SMTP session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plain connection (local catchers such as Mailpit)
    None,
    /// Upgrade with STARTTLS, usually port 587
    StartTls,
    /// Implicit TLS, usually port 465
    Tls,
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "plain" => Ok(SmtpSecurity::None),
            "starttls" => Ok(SmtpSecurity::StartTls),
            "tls" | "ssl" => Ok(SmtpSecurity::Tls),
            other => Err(format!("unknown security mode '{}' (none|starttls|tls)", other)),
        }
    }
}

impl fmt::Display for SmtpSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SmtpSecurity::None => "none",
            SmtpSecurity::StartTls => "starttls",
            SmtpSecurity::Tls => "tls",
        };
        f.write_str(s)
    }
}

/// SMTP transport configuration
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Mailbox,
    pub security: SmtpSecurity,
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = env_optional("SMTP_USER");
        let password = env_optional("SMTP_PASS");
        if username.is_some() != password.is_some() {
            return Err(ConfigError::parse(
                "SMTP_PASS",
                "SMTP_USER and SMTP_PASS must be set together",
            ));
        }

        let from = env_required("EMAIL_FROM")?
            .parse::<Mailbox>()
            .map_err(|e| ConfigError::parse("EMAIL_FROM", e))?;

        let security = env_or_default("SMTP_SECURITY", "starttls")
            .parse()
            .map_err(|e: String| ConfigError::parse("SMTP_SECURITY", e))?;

        Ok(Self {
            host: env_required("SMTP_HOST")?,
            port: env_parse("SMTP_PORT", 587)?,
            username,
            password,
            from,
            security,
        })
    }
}

/// SMTP mail transport
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(config: SmtpConfig) -> Result<Self, ConfigError> {
        let mut builder = match config.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| ConfigError::parse("SMTP_HOST", e))?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| ConfigError::parse("SMTP_HOST", e))?
            }
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        builder = builder.port(config.port);
        if let (Some(user), Some(pass)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            security = %config.security,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            from: config.from,
        })
    }

    fn build_message(&self, mail: &OutboundMail) -> Result<Message, TransportError> {
        let address: Address = mail
            .to_email
            .parse()
            .map_err(|_| TransportError::InvalidAddress(mail.to_email.clone()))?;
        let name = Some(mail.to_name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(name, address))
            .subject(&mail.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html_body.clone()),
                    ),
            )
            .map_err(|e| TransportError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
        let message = self.build_message(mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| TransportError::Rejected(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
