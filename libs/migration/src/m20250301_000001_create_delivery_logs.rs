use sea_orm_migration::prelude::*;

use crate::m20250301_000000_create_subscribers::Subscribers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeliveryLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeliveryLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeliveryLogs::RecipientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryLogs::SentAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DeliveryLogs::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeliveryLogs::Info).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_logs_recipient")
                            .from(DeliveryLogs::Table, DeliveryLogs::RecipientId)
                            .to(Subscribers::Table, Subscribers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_delivery_logs_sent_at")
                    .table(DeliveryLogs::Table)
                    .col(DeliveryLogs::SentAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeliveryLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DeliveryLogs {
    Table,
    Id,
    RecipientId,
    SentAt,
    Status,
    Info,
}
