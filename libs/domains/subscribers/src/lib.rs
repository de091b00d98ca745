//! Subscribers Domain
//!
//! Owns the subscriber records and the append-only delivery log written by
//! the broadcast dispatch loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ SubscriptionService  │  ← subscribe / unsubscribe rules
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │   RecipientStore     │  ← trait consumed by the dispatch loop
//! └──────────┬───────────┘
//!      ┌─────┴──────┐
//!  InMemory      Postgres (sea-orm)
//! ```

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{StoreError, StoreResult};
pub use models::{
    normalize_email, DeliveryLogEntry, DeliveryLogView, DeliveryStatus, NewRecipient, Recipient,
};
pub use postgres::PgRecipientStore;
pub use repository::{InMemoryRecipientStore, RecipientStore};
pub use service::{SubscriptionService, DEFAULT_LOG_LIMIT};
