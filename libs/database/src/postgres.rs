//! PostgreSQL connection pool, retrying connector and migration runner.

use core_config::{env_parse, env_required, ConfigError, FromEnv};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

use crate::error::{DatabaseError, DatabaseResult};
use crate::retry::{retry_with_backoff, RetryConfig};

/// PostgreSQL pool configuration.
///
/// Environment variables:
/// - `DATABASE_URL` (required)
/// - `DB_MAX_CONNECTIONS` (default: 10)
/// - `DB_MIN_CONNECTIONS` (default: 1)
/// - `DB_CONNECT_TIMEOUT_SECS` (default: 8)
/// - `DB_ACQUIRE_TIMEOUT_SECS` (default: 8)
/// - `DB_SQLX_LOGGING` (default: false)
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub sqlx_logging: bool,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 8,
            acquire_timeout_secs: 8,
            sqlx_logging: false,
        }
    }

    pub fn into_connect_options(self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url);
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .sqlx_logging(self.sqlx_logging);
        opt
    }
}

impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new(env_required("DATABASE_URL")?);

        Ok(Self {
            max_connections: env_parse("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout_secs: env_parse(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            acquire_timeout_secs: env_parse(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            )?,
            sqlx_logging: env_parse("DB_SQLX_LOGGING", defaults.sqlx_logging)?,
            url: defaults.url,
        })
    }
}

/// Open a pool, retrying with exponential backoff.
///
/// Useful at process start when the database may still be coming up.
pub async fn connect_with_retry(
    config: PostgresConfig,
    retry: Option<RetryConfig>,
) -> DatabaseResult<DatabaseConnection> {
    let retry = retry.unwrap_or_default();
    let attempts = retry.attempts();
    let options = config.into_connect_options();

    let db = retry_with_backoff(|| Database::connect(options.clone()), retry)
        .await
        .map_err(|source| DatabaseError::ConnectionFailed { attempts, source })?;

    info!("Connected to PostgreSQL");
    Ok(db)
}

/// Apply all pending migrations of `M`
pub async fn run_migrations<M: MigratorTrait>(
    db: &DatabaseConnection,
    app_name: &str,
) -> DatabaseResult<()> {
    info!(app = app_name, "Running database migrations");
    M::up(db, None)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    info!(app = app_name, "Migrations applied");
    Ok(())
}
