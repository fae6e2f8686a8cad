use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ItemError, ItemResult};
use crate::models::{
    CreateItem, CreateNotification, EmbeddingCandidate, Item, ItemStatus, Notification, UpdateItem,
};

/// Repository trait for Item persistence
///
/// Embeddings are written alongside the item row and never returned as part
/// of [`Item`]; reads go through the recommendations domain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert a new on-sale item and its images
    async fn insert(
        &self,
        seller_id: &str,
        input: CreateItem,
        embedding: Option<Vec<f32>>,
    ) -> ItemResult<Item>;

    /// Get an item by ID
    async fn get(&self, id: &str) -> ItemResult<Option<Item>>;

    /// Update name, price and description.
    ///
    /// Fails with `NotFound`, `Unauthorized` when `input.user_id` is not the
    /// seller, or `CannotUpdateSoldItem`. A `None` embedding keeps the stored one.
    async fn update(&self, input: UpdateItem, embedding: Option<Vec<f32>>) -> ItemResult<Item>;

    /// Mark an on-sale item as sold to `buyer_id`.
    ///
    /// Returns `false` when the item was not on sale at the time of the write.
    async fn purchase(&self, id: &str, buyer_id: &str) -> ItemResult<bool>;

    /// Items whose embedding has never been generated
    async fn items_missing_embeddings(&self) -> ItemResult<Vec<EmbeddingCandidate>>;

    /// Store a freshly generated embedding
    async fn set_embedding(&self, id: &str, embedding: &[f32]) -> ItemResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, input: CreateNotification) -> ItemResult<Notification>;
}

#[derive(Debug, Clone)]
struct StoredItem {
    item: Item,
    embedding: Option<Vec<f32>>,
}

/// In-memory implementation of ItemRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryItemRepository {
    items: Arc<RwLock<HashMap<String, StoredItem>>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored embedding of an item, if any
    pub async fn embedding_of(&self, id: &str) -> Option<Vec<f32>> {
        let items = self.items.read().await;
        items.get(id).and_then(|stored| stored.embedding.clone())
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn insert(
        &self,
        seller_id: &str,
        input: CreateItem,
        embedding: Option<Vec<f32>>,
    ) -> ItemResult<Item> {
        let now = Utc::now();
        let item = Item {
            id: Uuid::now_v7().to_string(),
            user_id: seller_id.to_string(),
            buyer_id: None,
            name: input.name,
            price: input.price,
            description: input.description,
            status: ItemStatus::OnSale,
            image_urls: input.image_urls,
            has_embedding: embedding.is_some(),
            created_at: now,
            updated_at: now,
            purchased_at: None,
        };

        let mut items = self.items.write().await;
        items.insert(
            item.id.clone(),
            StoredItem {
                item: item.clone(),
                embedding,
            },
        );

        Ok(item)
    }

    async fn get(&self, id: &str) -> ItemResult<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(id).map(|stored| stored.item.clone()))
    }

    async fn update(&self, input: UpdateItem, embedding: Option<Vec<f32>>) -> ItemResult<Item> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(&input.item_id)
            .ok_or_else(|| ItemError::NotFound(input.item_id.clone()))?;

        if stored.item.user_id != input.user_id {
            return Err(ItemError::Unauthorized(input.item_id));
        }
        if stored.item.status == ItemStatus::Sold {
            return Err(ItemError::CannotUpdateSoldItem(input.item_id));
        }

        stored.item.name = input.name;
        stored.item.price = input.price;
        stored.item.description = input.description;
        stored.item.updated_at = Utc::now();
        if let Some(embedding) = embedding {
            stored.embedding = Some(embedding);
            stored.item.has_embedding = true;
        }

        Ok(stored.item.clone())
    }

    async fn purchase(&self, id: &str, buyer_id: &str) -> ItemResult<bool> {
        let mut items = self.items.write().await;
        let Some(stored) = items.get_mut(id) else {
            return Ok(false);
        };
        if stored.item.status != ItemStatus::OnSale {
            return Ok(false);
        }

        let now = Utc::now();
        stored.item.status = ItemStatus::Sold;
        stored.item.buyer_id = Some(buyer_id.to_string());
        stored.item.purchased_at = Some(now);
        stored.item.updated_at = now;
        Ok(true)
    }

    async fn items_missing_embeddings(&self) -> ItemResult<Vec<EmbeddingCandidate>> {
        let items = self.items.read().await;
        let mut missing: Vec<EmbeddingCandidate> = items
            .values()
            .filter(|stored| stored.embedding.is_none())
            .map(|stored| EmbeddingCandidate {
                id: stored.item.id.clone(),
                name: stored.item.name.clone(),
                description: stored.item.description.clone(),
                status: stored.item.status,
            })
            .collect();
        missing.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(missing)
    }

    async fn set_embedding(&self, id: &str, embedding: &[f32]) -> ItemResult<()> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(id)
            .ok_or_else(|| ItemError::NotFound(id.to_string()))?;
        stored.embedding = Some(embedding.to_vec());
        stored.item.has_embedding = true;
        Ok(())
    }
}

/// In-memory implementation of NotificationRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn for_user(&self, user_id: &str) -> Vec<Notification> {
        let notifications = self.notifications.read().await;
        notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, input: CreateNotification) -> ItemResult<Notification> {
        let notification = Notification {
            id: Uuid::now_v7().to_string(),
            user_id: input.user_id,
            kind: input.kind,
            item_id: input.item_id,
            item_name: input.item_name,
            message: input.message,
            is_read: false,
            created_at: Utc::now(),
        };

        let mut notifications = self.notifications.write().await;
        notifications.push(notification.clone());
        Ok(notification)
    }
}
