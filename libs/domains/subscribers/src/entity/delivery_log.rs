use sea_orm::entity::prelude::*;

use crate::error::StoreError;
use crate::models::{DeliveryLogView, DeliveryStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "delivery_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub recipient_id: i64,
    pub sent_at: DateTimeWithTimeZone,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub info: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subscriber::Entity",
        from = "Column::RecipientId",
        to = "super::subscriber::Column::Id"
    )]
    Subscriber,
}

impl Related<super::subscriber::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriber.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn parse_status(raw: &str) -> Result<DeliveryStatus, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Database(format!("unknown delivery status '{}'", raw)))
}

impl TryFrom<(Model, super::subscriber::Model)> for DeliveryLogView {
    type Error = StoreError;

    fn try_from((log, subscriber): (Model, super::subscriber::Model)) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_status(&log.status)?,
            id: log.id,
            recipient_id: log.recipient_id,
            name: subscriber.name,
            email: subscriber.email,
            info: log.info,
            sent_at: log.sent_at.into(),
        })
    }
}
