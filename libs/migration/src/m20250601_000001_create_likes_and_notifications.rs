use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250601_000000_create_items::Items;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(string(Likes::UserId))
                    .col(string(Likes::ItemId))
                    .col(
                        timestamp_with_time_zone(Likes::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(Index::create().col(Likes::UserId).col(Likes::ItemId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_item_id")
                            .from(Likes::Table, Likes::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(string(Notifications::Id).primary_key())
                    .col(string(Notifications::UserId))
                    .col(string(Notifications::Kind))
                    .col(string(Notifications::ItemId))
                    .col(string(Notifications::ItemName))
                    .col(text(Notifications::Message))
                    .col(boolean(Notifications::IsRead).default(false))
                    .col(
                        timestamp_with_time_zone(Notifications::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_user_id")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    UserId,
    ItemId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Kind,
    ItemId,
    ItemName,
    Message,
    IsRead,
    CreatedAt,
}
