//! Database connectivity for the daily mailer.
//!
//! PostgreSQL pool configuration, connect-with-retry and migration running.
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use core_config::FromEnv;
//!
//! let db = postgres::connect_with_retry(PostgresConfig::from_env()?, None).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "daily_mailer").await?;
//! ```

pub mod error;
pub mod postgres;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{retry_with_backoff, RetryConfig};
