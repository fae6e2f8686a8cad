use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::RecommendationResult;
use crate::models::{Embedding, EmbeddingLoad, ItemId, ItemStatus, ItemSummary};

/// Source of truth for item embeddings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Load the embedding of every on-sale item that has one.
    ///
    /// Rows that cannot be decoded are skipped and reported, never fatal.
    async fn load_all_on_sale_embeddings(&self) -> RecommendationResult<EmbeddingLoad>;

    /// Load a single item's embedding regardless of its status
    async fn load_embedding(&self, item_id: &str) -> RecommendationResult<Option<Embedding>>;
}

/// Bulk lookup of display records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Fetch summaries for `item_ids`. Result order is unspecified and unknown
    /// IDs are silently absent.
    async fn items_by_ids(&self, item_ids: &[ItemId]) -> RecommendationResult<Vec<ItemSummary>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// IDs of every item the user has liked, most recent first
    async fn liked_item_ids(&self, user_id: &str) -> RecommendationResult<Vec<ItemId>>;
}

#[derive(Debug, Clone)]
struct StoredItem {
    summary: ItemSummary,
    embedding: Option<Embedding>,
}

/// In-memory implementation of the store traits (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryMarketStore {
    items: Arc<RwLock<HashMap<ItemId, StoredItem>>>,
    likes: Arc<RwLock<HashMap<String, Vec<ItemId>>>>,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item and its embedding
    pub async fn put_item(&self, summary: ItemSummary, embedding: Option<Vec<f32>>) {
        let mut items = self.items.write().await;
        items.insert(
            summary.id.clone(),
            StoredItem {
                summary,
                embedding: embedding.map(Embedding::from),
            },
        );
    }

    pub async fn mark_sold(&self, item_id: &str) -> bool {
        let mut items = self.items.write().await;
        match items.get_mut(item_id) {
            Some(item) => {
                item.summary.status = ItemStatus::Sold;
                true
            }
            None => false,
        }
    }

    pub async fn add_like(&self, user_id: &str, item_id: &str) {
        let mut likes = self.likes.write().await;
        let liked = likes.entry(user_id.to_string()).or_default();
        if !liked.iter().any(|id| id == item_id) {
            liked.insert(0, item_id.to_string());
        }
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryMarketStore {
    async fn load_all_on_sale_embeddings(&self) -> RecommendationResult<EmbeddingLoad> {
        let items = self.items.read().await;

        let mut load = EmbeddingLoad::default();
        for (id, item) in items.iter() {
            if item.summary.status != ItemStatus::OnSale {
                continue;
            }
            if let Some(embedding) = item.embedding.as_ref().filter(|e| !e.is_empty()) {
                load.embeddings.insert(id.clone(), embedding.clone());
            }
        }

        Ok(load)
    }

    async fn load_embedding(&self, item_id: &str) -> RecommendationResult<Option<Embedding>> {
        let items = self.items.read().await;
        Ok(items.get(item_id).and_then(|item| item.embedding.clone()))
    }
}

#[async_trait]
impl ItemCatalog for InMemoryMarketStore {
    async fn items_by_ids(&self, item_ids: &[ItemId]) -> RecommendationResult<Vec<ItemSummary>> {
        let items = self.items.read().await;

        // Walk the map rather than the request so callers cannot rely on order
        Ok(items
            .values()
            .filter(|item| item_ids.contains(&item.summary.id))
            .map(|item| item.summary.clone())
            .collect())
    }
}

#[async_trait]
impl LikeRepository for InMemoryMarketStore {
    async fn liked_item_ids(&self, user_id: &str) -> RecommendationResult<Vec<ItemId>> {
        let likes = self.likes.read().await;
        Ok(likes.get(user_id).cloned().unwrap_or_default())
    }
}
