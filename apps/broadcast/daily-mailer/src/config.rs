//! Configuration for the daily mailer

use core_config::{env_parse, FromEnv};
use database::postgres::PostgresConfig;
use domain_broadcast::{BroadcastConfig, BroadcastResult, SmtpConfig, SmtpTransport};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_METRICS_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9100);

/// Settings every command reads; none of them need the database
#[derive(Debug, Clone)]
pub struct Config {
    pub broadcast: BroadcastConfig,
    /// Where the Prometheus exporter listens in `schedule` mode
    pub metrics_addr: SocketAddr,
}

impl Config {
    /// Load schedule and metrics settings from environment variables
    pub fn from_env() -> BroadcastResult<Self> {
        Ok(Self {
            broadcast: BroadcastConfig::from_env()?,
            metrics_addr: env_parse("METRICS_ADDR", DEFAULT_METRICS_ADDR)?,
        })
    }
}

/// Database settings; only commands that touch the store load them
pub fn database_config() -> BroadcastResult<PostgresConfig> {
    Ok(PostgresConfig::from_env()?)
}

/// Build the SMTP transport; only commands that send mail need it
pub fn smtp_transport() -> BroadcastResult<SmtpTransport> {
    Ok(SmtpTransport::new(SmtpConfig::from_env()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_broadcast::BroadcastError;

    #[test]
    fn test_database_config_requires_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = database_config().unwrap_err();
            assert!(matches!(err, BroadcastError::Config(_)));
        });
    }

    #[test]
    fn test_config_does_not_need_database() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", None),
                ("DAILY_CRON", Some("30 8 * * *")),
                ("DAILY_TIMEZONE", None),
                ("METRICS_ADDR", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.broadcast.schedule.to_string(), "30 8 * * *");
                assert_eq!(config.metrics_addr, DEFAULT_METRICS_ADDR);
            },
        );
    }

    #[test]
    fn test_metrics_addr_override() {
        temp_env::with_vars(
            [("DAILY_CRON", None), ("METRICS_ADDR", Some("127.0.0.1:9464"))],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.metrics_addr, "127.0.0.1:9464".parse().unwrap());
            },
        );

        temp_env::with_vars(
            [("DAILY_CRON", None), ("METRICS_ADDR", Some("not-an-address"))],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_database_config_from_env() {
        temp_env::with_var("DATABASE_URL", Some("postgresql://localhost/mailer"), || {
            let config = database_config().unwrap();
            assert_eq!(config.url, "postgresql://localhost/mailer");
        });
    }
}
