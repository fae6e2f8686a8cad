use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use domain_recommendations::entity::{item_images, items};

// ===== Notifications Entity =====

pub mod notifications {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "notifications")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub user_id: String,
        pub kind: String,
        pub item_id: String,
        pub item_name: String,
        #[sea_orm(column_type = "Text")]
        pub message: String,
        pub is_read: bool,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::Notification {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                user_id: model.user_id,
                kind: model.kind.parse().unwrap_or_default(),
                item_id: model.item_id,
                item_name: model.item_name,
                message: model.message,
                is_read: model.is_read,
                created_at: model.created_at.into(),
            }
        }
    }

    impl From<crate::models::CreateNotification> for ActiveModel {
        fn from(input: crate::models::CreateNotification) -> Self {
            ActiveModel {
                id: Set(Uuid::now_v7().to_string()),
                user_id: Set(input.user_id),
                kind: Set(input.kind.to_string()),
                item_id: Set(input.item_id),
                item_name: Set(input.item_name),
                message: Set(input.message),
                is_read: Set(false),
                created_at: Set(chrono::Utc::now().into()),
            }
        }
    }
}
