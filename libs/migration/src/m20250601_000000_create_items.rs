use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(ItemStatus::Enum)
                    .values([ItemStatus::OnSale, ItemStatus::Sold])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(string(Users::Id).primary_key())
                    .col(string(Users::Name))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(string(Items::Id).primary_key())
                    .col(string(Items::UserId))
                    .col(string_null(Items::BuyerId))
                    .col(string(Items::Name))
                    .col(integer(Items::Price))
                    .col(text(Items::Description).default(""))
                    .col(
                        ColumnDef::new(Items::Status)
                            .enumeration(ItemStatus::Enum, [ItemStatus::OnSale, ItemStatus::Sold])
                            .not_null()
                            .default("on_sale"),
                    )
                    // JSON array of floats, NULL until an embedding has been generated
                    .col(text_null(Items::Embedding))
                    .col(
                        timestamp_with_time_zone(Items::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Items::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Items::PurchasedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItemImages::Table)
                    .if_not_exists()
                    .col(pk_auto(ItemImages::Id))
                    .col(string(ItemImages::ItemId))
                    .col(text(ItemImages::ImageUrl))
                    .col(integer(ItemImages::Position).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_images_item_id")
                            .from(ItemImages::Table, ItemImages::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_items_status")
                    .table(Items::Table)
                    .col(Items::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_items_user_id")
                    .table(Items::Table)
                    .col(Items::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_images_item_id")
                    .table(ItemImages::Table)
                    .col(ItemImages::ItemId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemImages::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ItemStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Items {
    Table,
    Id,
    UserId,
    BuyerId,
    Name,
    Price,
    Description,
    Status,
    Embedding,
    CreatedAt,
    UpdatedAt,
    PurchasedAt,
}

#[derive(DeriveIden)]
enum ItemImages {
    Table,
    Id,
    ItemId,
    ImageUrl,
    Position,
}

#[derive(DeriveIden)]
enum ItemStatus {
    #[sea_orm(iden = "item_status")]
    Enum,
    #[sea_orm(iden = "on_sale")]
    OnSale,
    #[sea_orm(iden = "sold")]
    Sold,
}
