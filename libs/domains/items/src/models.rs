use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

pub use domain_recommendations::{ItemId, ItemStatus};

/// Marketplace listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Seller
    pub user_id: String,
    pub buyer_id: Option<String>,
    pub name: String,
    pub price: i32,
    pub description: String,
    pub status: ItemStatus,
    /// Image URLs in display order
    pub image_urls: Vec<String>,
    pub has_embedding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub purchased_at: Option<DateTime<Utc>>,
}

/// DTO for listing a new item
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItem {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price: i32,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 9, message = "Between 1 and 9 images are required"))]
    pub image_urls: Vec<String>,
}

/// DTO for editing an existing listing
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateItem {
    #[validate(length(min = 1))]
    pub item_id: ItemId,
    /// User requesting the change; must be the seller
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "Price must be positive"))]
    pub price: i32,
    #[serde(default)]
    pub description: String,
}

/// Item that still needs an embedding
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingCandidate {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub status: ItemStatus,
}

/// Outcome of an embedding backfill run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Notification kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// One of the user's items was bought
    #[default]
    Purchase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub item_id: ItemId,
    pub item_name: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a notification
#[derive(Debug, Clone, PartialEq)]
pub struct CreateNotification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub item_id: ItemId,
    pub item_name: String,
    pub message: String,
}

impl CreateNotification {
    /// Tell the seller that `item` has been bought
    pub fn purchase(item: &Item) -> Self {
        Self {
            user_id: item.user_id.clone(),
            kind: NotificationKind::Purchase,
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            message: format!("{} has been purchased", item.name),
        }
    }
}
