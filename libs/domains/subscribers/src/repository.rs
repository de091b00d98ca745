use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    normalize_email, DeliveryLogEntry, DeliveryLogView, DeliveryStatus, NewRecipient, Recipient,
};

/// Persistence contract for subscribers and their delivery log.
///
/// Every method is a single point-in-time operation; callers never hold a
/// lock on the store across calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Active recipients ordered by id ascending
    async fn list_active_recipients(&self) -> StoreResult<Vec<Recipient>>;

    /// Append a delivery log entry and return its id
    async fn record_delivery(
        &self,
        recipient_id: i64,
        status: DeliveryStatus,
        info: &str,
    ) -> StoreResult<i64>;

    /// Register a subscriber; fails with `DuplicateEmail` if the address exists
    async fn add_recipient(&self, input: NewRecipient) -> StoreResult<Recipient>;

    /// Case-insensitive lookup, active or not
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Recipient>>;

    /// Mark the subscriber inactive, returning the number of rows changed
    async fn deactivate(&self, email: &str) -> StoreResult<u64>;

    /// Re-activate an existing subscriber, refreshing the display name
    async fn reactivate(&self, id: i64, name: &str) -> StoreResult<Recipient>;

    /// Newest delivery log entries first, joined with their recipient
    async fn recent_deliveries(&self, limit: u64) -> StoreResult<Vec<DeliveryLogView>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    recipients: BTreeMap<i64, Recipient>,
    deliveries: Vec<DeliveryLogEntry>,
    next_recipient_id: i64,
    next_delivery_id: i64,
    fail_snapshots: bool,
    failing_log_writes: HashSet<i64>,
}

/// In-memory implementation of RecipientStore (for development/testing).
///
/// Failure hooks let tests simulate an unreachable store for the snapshot
/// query or for log writes of specific recipients.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecipientStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryRecipientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `list_active_recipients` fail until switched off again
    pub async fn fail_snapshots(&self, fail: bool) {
        self.state.write().await.fail_snapshots = fail;
    }

    /// Make `record_delivery` fail for one recipient
    pub async fn fail_log_writes_for(&self, recipient_id: i64) {
        self.state.write().await.failing_log_writes.insert(recipient_id);
    }

    /// Every delivery log entry in the order it was written
    pub async fn deliveries(&self) -> Vec<DeliveryLogEntry> {
        self.state.read().await.deliveries.clone()
    }
}

#[async_trait]
impl RecipientStore for InMemoryRecipientStore {
    async fn list_active_recipients(&self) -> StoreResult<Vec<Recipient>> {
        let state = self.state.read().await;
        if state.fail_snapshots {
            return Err(StoreError::Database("connection refused".to_string()));
        }

        // BTreeMap iteration is already ordered by id
        Ok(state
            .recipients
            .values()
            .filter(|r| r.active)
            .cloned()
            .collect())
    }

    async fn record_delivery(
        &self,
        recipient_id: i64,
        status: DeliveryStatus,
        info: &str,
    ) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        if state.failing_log_writes.contains(&recipient_id) {
            return Err(StoreError::Database(format!(
                "insert into delivery_logs failed for recipient {}",
                recipient_id
            )));
        }

        state.next_delivery_id += 1;
        let id = state.next_delivery_id;
        state.deliveries.push(DeliveryLogEntry {
            id,
            recipient_id,
            sent_at: Utc::now(),
            status,
            info: info.to_string(),
        });
        Ok(id)
    }

    async fn add_recipient(&self, input: NewRecipient) -> StoreResult<Recipient> {
        let mut state = self.state.write().await;
        let email = normalize_email(&input.email);

        if state.recipients.values().any(|r| r.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }

        state.next_recipient_id += 1;
        let recipient = Recipient {
            id: state.next_recipient_id,
            name: input.name,
            email,
            active: true,
            created_at: Utc::now(),
        };
        state.recipients.insert(recipient.id, recipient.clone());

        tracing::info!(recipient_id = recipient.id, "Created subscriber");
        Ok(recipient)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Recipient>> {
        let email = normalize_email(email);
        let state = self.state.read().await;
        Ok(state.recipients.values().find(|r| r.email == email).cloned())
    }

    async fn deactivate(&self, email: &str) -> StoreResult<u64> {
        let email = normalize_email(email);
        let mut state = self.state.write().await;

        let mut changed = 0;
        for recipient in state.recipients.values_mut().filter(|r| r.email == email) {
            recipient.active = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn reactivate(&self, id: i64, name: &str) -> StoreResult<Recipient> {
        let mut state = self.state.write().await;
        let recipient = state
            .recipients
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))?;

        recipient.active = true;
        recipient.name = name.to_string();
        Ok(recipient.clone())
    }

    async fn recent_deliveries(&self, limit: u64) -> StoreResult<Vec<DeliveryLogView>> {
        let state = self.state.read().await;

        Ok(state
            .deliveries
            .iter()
            .rev()
            .take(limit as usize)
            .filter_map(|entry| {
                let recipient = state.recipients.get(&entry.recipient_id)?;
                Some(DeliveryLogView {
                    id: entry.id,
                    recipient_id: entry.recipient_id,
                    name: recipient.name.clone(),
                    email: recipient.email.clone(),
                    status: entry.status,
                    info: entry.info.clone(),
                    sent_at: entry.sent_at,
                })
            })
            .collect())
    }
}
