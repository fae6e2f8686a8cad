use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;

use crate::cache::EmbeddingCache;
use crate::error::RecommendationResult;
use crate::models::{ItemId, ItemSummary};
use crate::ranking::{ItemScore, mean_vector, rank};
use crate::repository::{EmbeddingStore, ItemCatalog, LikeRepository};

/// Service layer answering recommendation queries
#[derive(Clone)]
pub struct RecommendationService {
    cache: Arc<EmbeddingCache>,
    embeddings: Arc<dyn EmbeddingStore>,
    catalog: Arc<dyn ItemCatalog>,
    likes: Arc<dyn LikeRepository>,
}

impl RecommendationService {
    pub fn new(
        cache: Arc<EmbeddingCache>,
        embeddings: Arc<dyn EmbeddingStore>,
        catalog: Arc<dyn ItemCatalog>,
        likes: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            cache,
            embeddings,
            catalog,
            likes,
        }
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Items whose embeddings are closest to `item_id`'s.
    ///
    /// When the item is not cached (for example because it has been sold) its
    /// stored embedding is used instead. An item with no embedding anywhere
    /// yields an empty list.
    #[instrument(skip(self))]
    pub async fn similar_items(&self, item_id: &str, limit: usize) -> RecommendationResult<Vec<ItemSummary>> {
        let snapshot = self.cache.snapshot().await;

        let query = match snapshot.get(item_id) {
            Some(embedding) => embedding.clone(),
            None => match self.embeddings.load_embedding(item_id).await? {
                Some(embedding) if !embedding.is_empty() => {
                    tracing::debug!(item_id = %item_id, "Using stored embedding for uncached item");
                    embedding
                }
                _ => {
                    tracing::debug!(item_id = %item_id, "No embedding for item");
                    return Ok(Vec::new());
                }
            },
        };

        let exclude: HashSet<&str> = HashSet::from([item_id]);
        let ranked = rank(&query, snapshot.iter(), &exclude, limit);

        self.hydrate(ranked).await
    }

    /// Items matching the average taste of everything `user_id` has liked.
    ///
    /// Only liked items present in the cache contribute to the preference
    /// vector. Liked items are never recommended back.
    #[instrument(skip(self))]
    pub async fn personalized_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RecommendationResult<Vec<ItemSummary>> {
        let liked = self.likes.liked_item_ids(user_id).await?;
        if liked.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = self.cache.snapshot().await;

        let preference = mean_vector(
            liked
                .iter()
                .filter_map(|id| snapshot.get(id))
                .map(|embedding| &embedding[..]),
        );

        let Some(preference) = preference else {
            tracing::debug!(user_id = %user_id, liked = liked.len(), "No cached embeddings for liked items");
            return Ok(Vec::new());
        };

        let exclude: HashSet<&str> = liked.iter().map(String::as_str).collect();
        let ranked = rank(&preference, snapshot.iter(), &exclude, limit);

        self.hydrate(ranked).await
    }

    /// Resolve ranked IDs into summaries, keeping rank order.
    ///
    /// IDs the catalog cannot resolve are dropped.
    async fn hydrate(&self, ranked: Vec<ItemScore>) -> RecommendationResult<Vec<ItemSummary>> {
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ItemId> = ranked.iter().map(|s| s.item_id.clone()).collect();
        let mut by_id: HashMap<ItemId, ItemSummary> = self
            .catalog
            .items_by_ids(&ids)
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let items: Vec<ItemSummary> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

        if items.len() < ids.len() {
            tracing::debug!(
                requested = ids.len(),
                resolved = items.len(),
                "Dropped unresolved recommendation IDs"
            );
        }

        Ok(items)
    }
}
