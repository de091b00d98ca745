use core_config::ConfigError;
use domain_subscribers::StoreError;
use thiserror::Error;

/// Result type alias for broadcast operations
pub type BroadcastResult<T> = Result<T, BroadcastError>;

/// Top-level error for the broadcast domain
#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cron(#[from] CronError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Run-level failure; per-recipient failures never surface here.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to load active recipients: {0}")]
    Snapshot(#[source] StoreError),
}

/// Failure to hand one message to the mail transport.
///
/// The `Display` output is written verbatim as the `info` of the
/// delivery log entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("{0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CronError {
    #[error("expected 5 or 6 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid {field} field '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid cron expression '{expression}': {reason}")]
    Expression { expression: String, reason: String },
}
