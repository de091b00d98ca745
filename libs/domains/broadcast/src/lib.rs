//! Broadcast Domain
//!
//! The daily broadcast pipeline: a scheduler fires on a cron cadence in a
//! fixed timezone, the dispatcher takes one snapshot of active recipients
//! and sends each of them the daily message, recording one delivery log
//! entry per recipient.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │    Scheduler     │  ← cron + timezone, one run at a time
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐      ┌──────────────────┐
//! │    Dispatcher    │ ───▶ │  MailTransport   │  ← SMTP / mock
//! └────────┬─────────┘      └──────────────────┘
//!          │
//! ┌────────▼─────────┐
//! │  RecipientStore  │  ← domain_subscribers
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_broadcast::*;
//! use domain_subscribers::InMemoryRecipientStore;
//! use std::sync::Arc;
//!
//! let config = BroadcastConfig::from_env()?;
//! let dispatcher = Dispatcher::new(
//!     Arc::new(InMemoryRecipientStore::new()),
//!     Arc::new(MockTransport::new()),
//!     config.pacing,
//! );
//! let scheduler = Scheduler::new(dispatcher, config.schedule, config.timezone);
//! scheduler.run(shutdown_rx).await;
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod schedule;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::{BroadcastConfig, DEFAULT_CRON, DEFAULT_PACING_MS, DEFAULT_TIMEZONE};
pub use schedule::CronSchedule;
pub use dispatch::{DeliveryOutcome, Dispatcher, RunReport};
pub use error::{BroadcastError, BroadcastResult, CronError, DispatchError, TransportError};
pub use message::{build_message, RenderedMessage};
pub use scheduler::{RunState, Scheduler, TriggerOutcome};
pub use transport::{
    MailTransport, MockTransport, OutboundMail, SmtpConfig, SmtpSecurity, SmtpTransport,
};
