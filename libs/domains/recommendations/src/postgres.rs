use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::collections::HashMap;

use crate::{
    entity::{item_images, items, likes},
    error::RecommendationResult,
    models::{Embedding, EmbeddingLoad, ItemId, ItemStatus, ItemSummary, decode_embedding},
    repository::{EmbeddingStore, ItemCatalog, LikeRepository},
};

/// PostgreSQL-backed store for embeddings, item summaries and likes
#[derive(Clone)]
pub struct PgRecommendationRepository {
    db: DatabaseConnection,
}

impl PgRecommendationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// First image of every requested item, keyed by item ID
    async fn first_images(&self, item_ids: &[ItemId]) -> RecommendationResult<HashMap<ItemId, String>> {
        let rows: Vec<(String, String)> = item_images::Entity::find()
            .select_only()
            .column(item_images::Column::ItemId)
            .column(item_images::Column::ImageUrl)
            .filter(item_images::Column::ItemId.is_in(item_ids.iter().cloned()))
            .order_by_asc(item_images::Column::ItemId)
            .order_by_asc(item_images::Column::Position)
            .order_by_asc(item_images::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut images = HashMap::with_capacity(item_ids.len());
        for (item_id, url) in rows {
            images.entry(item_id).or_insert(url);
        }

        Ok(images)
    }
}

#[async_trait]
impl EmbeddingStore for PgRecommendationRepository {
    async fn load_all_on_sale_embeddings(&self) -> RecommendationResult<EmbeddingLoad> {
        let rows: Vec<(String, Option<String>)> = items::Entity::find()
            .select_only()
            .column(items::Column::Id)
            .column(items::Column::Embedding)
            .filter(items::Column::Status.eq(ItemStatus::OnSale))
            .filter(items::Column::Embedding.is_not_null())
            .into_tuple()
            .all(&self.db)
            .await?;

        tracing::debug!(rows = rows.len(), "Fetched on-sale embeddings");
        Ok(EmbeddingLoad::from_rows(rows))
    }

    async fn load_embedding(&self, item_id: &str) -> RecommendationResult<Option<Embedding>> {
        let raw: Option<Option<String>> = items::Entity::find()
            .select_only()
            .column(items::Column::Embedding)
            .filter(items::Column::Id.eq(item_id))
            .into_tuple()
            .one(&self.db)
            .await?;

        let Some(raw) = raw.flatten() else {
            return Ok(None);
        };

        match decode_embedding(&raw) {
            Ok(values) if !values.is_empty() => Ok(Some(Embedding::from(values))),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(item_id = %item_id, error = %e, "Stored embedding is malformed");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ItemCatalog for PgRecommendationRepository {
    async fn items_by_ids(&self, item_ids: &[ItemId]) -> RecommendationResult<Vec<ItemSummary>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = items::Entity::find()
            .filter(items::Column::Id.is_in(item_ids.iter().cloned()))
            .all(&self.db)
            .await?;

        let mut images = self.first_images(item_ids).await?;

        Ok(models
            .into_iter()
            .map(|m| ItemSummary {
                image_url: images.remove(&m.id).unwrap_or_default(),
                id: m.id,
                name: m.name,
                price: m.price,
                status: m.status,
            })
            .collect())
    }
}

#[async_trait]
impl LikeRepository for PgRecommendationRepository {
    async fn liked_item_ids(&self, user_id: &str) -> RecommendationResult<Vec<ItemId>> {
        let ids: Vec<String> = likes::Entity::find()
            .select_only()
            .column(likes::Column::ItemId)
            .filter(likes::Column::UserId.eq(user_id))
            .order_by_desc(likes::Column::CreatedAt)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(ids)
    }
}
