use chrono_tz::Tz;
use core_config::{env_or_default, env_parse, ConfigError, FromEnv};
use std::time::Duration;

use crate::schedule::CronSchedule;

pub const DEFAULT_CRON: &str = "0 9 * * *";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;
pub const DEFAULT_PACING_MS: u64 = 200;

/// Schedule and pacing for the daily broadcast, read once at startup
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    pub schedule: CronSchedule,
    pub timezone: Tz,
    pub pacing: Duration,
}

impl FromEnv for BroadcastConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let schedule = CronSchedule::parse(&env_or_default("DAILY_CRON", DEFAULT_CRON))
            .map_err(|e| ConfigError::parse("DAILY_CRON", e))?;

        Ok(Self {
            schedule,
            timezone: env_parse("DAILY_TIMEZONE", DEFAULT_TIMEZONE)?,
            pacing: Duration::from_millis(env_parse("DISPATCH_PACING_MS", DEFAULT_PACING_MS)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(["DAILY_CRON", "DAILY_TIMEZONE", "DISPATCH_PACING_MS"], || {
            let config = BroadcastConfig::from_env().unwrap();
            assert_eq!(config.schedule.to_string(), DEFAULT_CRON);
            assert_eq!(config.timezone, chrono_tz::America::Sao_Paulo);
            assert_eq!(config.pacing, Duration::from_millis(200));
        });
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("DAILY_CRON", Some("0 0 7 * * MON-FRI")),
                ("DAILY_TIMEZONE", Some("Europe/Lisbon")),
                ("DISPATCH_PACING_MS", Some("0")),
            ],
            || {
                let config = BroadcastConfig::from_env().unwrap();
                assert_eq!(config.timezone, chrono_tz::Europe::Lisbon);
                assert!(config.pacing.is_zero());
            },
        );
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        temp_env::with_vars(
            [("DAILY_CRON", Some("every morning")), ("DAILY_TIMEZONE", None)],
            || {
                let err = BroadcastConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "DAILY_CRON"));
            },
        );

        temp_env::with_vars(
            [("DAILY_CRON", None), ("DAILY_TIMEZONE", Some("Mars/Olympus"))],
            || {
                let err = BroadcastConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "DAILY_TIMEZONE"));
            },
        );
    }
}
