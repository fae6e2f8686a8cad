use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// ===== Items Entity =====

pub mod items {
    use super::*;
    use crate::models::ItemStatus;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub user_id: String,
        pub buyer_id: Option<String>,
        pub name: String,
        pub price: i32,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub status: ItemStatus,
        /// JSON array of floats
        #[sea_orm(column_type = "Text", nullable)]
        pub embedding: Option<String>,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
        pub purchased_at: Option<DateTimeWithTimeZone>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::item_images::Entity")]
        Images,
        #[sea_orm(has_many = "super::likes::Entity")]
        Likes,
    }

    impl Related<super::item_images::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Images.def()
        }
    }

    impl Related<super::likes::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Likes.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// ===== Item Images Entity =====

pub mod item_images {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "item_images")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub item_id: String,
        #[sea_orm(column_type = "Text")]
        pub image_url: String,
        pub position: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::items::Entity",
            from = "Column::ItemId",
            to = "super::items::Column::Id"
        )]
        Item,
    }

    impl Related<super::items::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Item.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// ===== Likes Entity =====

pub mod likes {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "likes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub item_id: String,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::items::Entity",
            from = "Column::ItemId",
            to = "super::items::Column::Id"
        )]
        Item,
    }

    impl Related<super::items::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Item.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
