use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr,
};

use crate::{
    entity::{delivery_log, subscriber},
    error::{StoreError, StoreResult},
    models::{normalize_email, DeliveryLogView, DeliveryStatus, NewRecipient, Recipient},
    repository::RecipientStore,
};

/// PostgreSQL-backed recipient store.
///
/// Holds a pooled connection handle; each call checks a connection out of
/// the pool for the duration of one statement.
#[derive(Clone)]
pub struct PgRecipientStore {
    db: DatabaseConnection,
}

impl PgRecipientStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipientStore for PgRecipientStore {
    async fn list_active_recipients(&self) -> StoreResult<Vec<Recipient>> {
        let models = subscriber::Entity::find()
            .filter(subscriber::Column::Active.eq(true))
            .order_by_asc(subscriber::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn record_delivery(
        &self,
        recipient_id: i64,
        status: DeliveryStatus,
        info: &str,
    ) -> StoreResult<i64> {
        let entry = delivery_log::ActiveModel {
            recipient_id: Set(recipient_id),
            sent_at: Set(Utc::now().into()),
            status: Set(status.to_string()),
            info: Set(info.to_string()),
            ..Default::default()
        };

        let model = entry.insert(&self.db).await?;
        Ok(model.id)
    }

    async fn add_recipient(&self, input: NewRecipient) -> StoreResult<Recipient> {
        let email = normalize_email(&input.email);

        let active_model = subscriber::ActiveModel {
            name: Set(input.name),
            email: Set(email.clone()),
            active: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    StoreError::DuplicateEmail(email.clone())
                }
                _ => StoreError::from(e),
            }
        })?;

        tracing::info!(recipient_id = model.id, "Created subscriber");
        Ok(model.into())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Recipient>> {
        let model = subscriber::Entity::find()
            .filter(subscriber::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn deactivate(&self, email: &str) -> StoreResult<u64> {
        let result = subscriber::Entity::update_many()
            .col_expr(subscriber::Column::Active, Expr::value(false))
            .filter(subscriber::Column::Email.eq(normalize_email(email)))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn reactivate(&self, id: i64, name: &str) -> StoreResult<Recipient> {
        let existing = subscriber::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))?;

        let mut active_model: subscriber::ActiveModel = existing.into();
        active_model.active = Set(true);
        active_model.name = Set(name.to_string());

        let model = active_model.update(&self.db).await?;
        Ok(model.into())
    }

    async fn recent_deliveries(&self, limit: u64) -> StoreResult<Vec<DeliveryLogView>> {
        let rows = delivery_log::Entity::find()
            .find_also_related(subscriber::Entity)
            .order_by_desc(delivery_log::Column::SentAt)
            .order_by_desc(delivery_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .filter_map(|(log, subscriber)| subscriber.map(|s| (log, s)))
            .map(DeliveryLogView::try_from)
            .collect()
    }
}
