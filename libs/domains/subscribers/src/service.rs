use std::sync::Arc;
use validator::{Validate, ValidateEmail};

use crate::error::{StoreError, StoreResult};
use crate::models::{normalize_email, DeliveryLogView, NewRecipient, Recipient};
use crate::repository::RecipientStore;

/// Default page size for `recent_deliveries`.
pub const DEFAULT_LOG_LIMIT: u64 = 50;

/// Subscribe/unsubscribe rules on top of a recipient store.
#[derive(Clone)]
pub struct SubscriptionService<S: RecipientStore> {
    store: Arc<S>,
}

impl<S: RecipientStore> SubscriptionService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn with_arc(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a subscriber.
    ///
    /// An address that exists but was unsubscribed is re-activated instead of
    /// rejected; an address that is still active yields `DuplicateEmail`.
    pub async fn subscribe(&self, name: &str, email: &str) -> StoreResult<Recipient> {
        let input = NewRecipient::new(name, email);
        input.validate()?;

        match self.store.find_by_email(&input.email).await? {
            Some(existing) if existing.active => Err(StoreError::DuplicateEmail(existing.email)),
            Some(existing) => {
                let recipient = self.store.reactivate(existing.id, &input.name).await?;
                tracing::info!(recipient_id = recipient.id, "Re-activated subscriber");
                Ok(recipient)
            }
            None => self.store.add_recipient(input).await,
        }
    }

    /// Stop future broadcasts to `email`. The record itself is kept.
    pub async fn unsubscribe(&self, email: &str) -> StoreResult<()> {
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(StoreError::Validation("a valid email is required".to_string()));
        }

        match self.store.deactivate(&email).await? {
            0 => Err(StoreError::NotFound(email)),
            _ => {
                tracing::info!(email = %email, "Unsubscribed");
                Ok(())
            }
        }
    }

    pub async fn active_subscribers(&self) -> StoreResult<Vec<Recipient>> {
        self.store.list_active_recipients().await
    }

    pub async fn recent_deliveries(&self, limit: Option<u64>) -> StoreResult<Vec<DeliveryLogView>> {
        self.store
            .recent_deliveries(limit.unwrap_or(DEFAULT_LOG_LIMIT))
            .await
    }
}
