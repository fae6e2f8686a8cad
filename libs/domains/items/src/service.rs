//! Item Service - Business logic layer
//!
//! Every successful write is pushed into the shared embedding cache so that
//! recommendations see it without waiting for a reload.

use domain_recommendations::{EmbeddingCache, EmbeddingProvider, embedding_text};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ItemError, ItemResult};
use crate::models::{BackfillReport, CreateItem, CreateNotification, Item, ItemStatus, UpdateItem};
use crate::repository::{ItemRepository, NotificationRepository};

/// Item service providing the marketplace write paths
#[derive(Clone)]
pub struct ItemService {
    items: Arc<dyn ItemRepository>,
    notifications: Arc<dyn NotificationRepository>,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: Arc<EmbeddingCache>,
}

impl ItemService {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        notifications: Arc<dyn NotificationRepository>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        Self {
            items,
            notifications,
            embedder,
            cache,
        }
    }

    /// List a new item for `seller_id`
    #[instrument(skip(self, input), fields(item_name = %input.name))]
    pub async fn register_item(&self, seller_id: &str, input: CreateItem) -> ItemResult<Item> {
        input.validate()?;

        let embedding = self.generate_embedding(&input.name, &input.description).await;
        let item = self.items.insert(seller_id, input, embedding.clone()).await?;

        if let Some(embedding) = embedding {
            self.cache.set(item.id.clone(), embedding).await;
        }

        Ok(item)
    }

    /// Get an item by ID
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: &str) -> ItemResult<Item> {
        self.items
            .get(id)
            .await?
            .ok_or_else(|| ItemError::NotFound(id.to_string()))
    }

    /// Edit a listing; only the seller may do so and only while it is on sale
    #[instrument(skip(self, input), fields(item_id = %input.item_id))]
    pub async fn update_item(&self, input: UpdateItem) -> ItemResult<Item> {
        input.validate()?;

        let embedding = self.generate_embedding(&input.name, &input.description).await;
        let item = self.items.update(input, embedding.clone()).await?;

        if let Some(embedding) = embedding {
            self.cache.set(item.id.clone(), embedding).await;
        }

        Ok(item)
    }

    /// Buy an on-sale item and notify its seller
    #[instrument(skip(self))]
    pub async fn purchase_item(&self, item_id: &str, buyer_id: &str) -> ItemResult<Item> {
        let item = self.get_item(item_id).await?;

        if item.status != ItemStatus::OnSale {
            return Err(ItemError::NotAvailable(item_id.to_string()));
        }

        // Another buyer may have won between the read and the write
        if !self.items.purchase(item_id, buyer_id).await? {
            return Err(ItemError::NotAvailable(item_id.to_string()));
        }

        if let Err(e) = self
            .notifications
            .create(CreateNotification::purchase(&item))
            .await
        {
            tracing::warn!(item_id = %item_id, error = %e, "Failed to create purchase notification");
        }

        self.cache.delete(item_id).await;

        tracing::info!(item_id = %item_id, buyer_id = %buyer_id, "Item purchased");
        self.get_item(item_id).await
    }

    /// Generate embeddings for every item that has none yet.
    ///
    /// Failures are counted per item and never abort the run.
    #[instrument(skip(self))]
    pub async fn backfill_embeddings(&self) -> ItemResult<BackfillReport> {
        let candidates = self.items.items_missing_embeddings().await?;

        let mut report = BackfillReport {
            total: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            let text = embedding_text(&candidate.name, &candidate.description);

            let embedding = match self.embedder.embed(&text).await {
                Ok(values) if !values.is_empty() => values,
                Ok(_) => {
                    tracing::warn!(item_id = %candidate.id, "Provider returned an empty embedding");
                    report.failed += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(item_id = %candidate.id, error = %e, "Failed to generate embedding");
                    report.failed += 1;
                    continue;
                }
            };

            if let Err(e) = self.items.set_embedding(&candidate.id, &embedding).await {
                tracing::warn!(item_id = %candidate.id, error = %e, "Failed to store embedding");
                report.failed += 1;
                continue;
            }

            if candidate.status == ItemStatus::OnSale {
                self.cache.set(candidate.id, embedding).await;
            }
            report.succeeded += 1;
        }

        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            model = %self.embedder.model_name(),
            "Embedding backfill finished"
        );

        Ok(report)
    }

    /// Embedding for the item text, or `None` when the provider fails
    async fn generate_embedding(&self, name: &str, description: &str) -> Option<Vec<f32>> {
        match self.embedder.embed(&embedding_text(name, description)).await {
            Ok(values) if !values.is_empty() => Some(values),
            Ok(_) => {
                tracing::warn!("Provider returned an empty embedding");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to generate embedding, continuing without one");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Notification, NotificationKind};
    use crate::repository::{
        InMemoryItemRepository, InMemoryNotificationRepository, MockItemRepository,
        MockNotificationRepository,
    };
    use domain_recommendations::{InMemoryMarketStore, RecommendationError, RecommendationResult};

    mockall::mock! {
        pub Embedder {}

        #[async_trait::async_trait]
        impl EmbeddingProvider for Embedder {
            fn model_name(&self) -> &str;
            async fn embed(&self, text: &str) -> RecommendationResult<Vec<f32>>;
        }
    }

    fn embedder_returning(values: Vec<f32>) -> MockEmbedder {
        let mut embedder = MockEmbedder::new();
        embedder.expect_model_name().return_const("test-model".to_string());
        embedder
            .expect_embed()
            .returning(move |_| Ok(values.clone()));
        embedder
    }

    fn failing_embedder() -> MockEmbedder {
        let mut embedder = MockEmbedder::new();
        embedder.expect_model_name().return_const("test-model".to_string());
        embedder
            .expect_embed()
            .returning(|_| Err(RecommendationError::Embedding("quota exceeded".to_string())));
        embedder
    }

    fn empty_cache() -> Arc<EmbeddingCache> {
        Arc::new(EmbeddingCache::new(Arc::new(InMemoryMarketStore::new())))
    }

    fn create_input() -> CreateItem {
        CreateItem {
            name: "Desk lamp".to_string(),
            price: 1500,
            description: "Warm light".to_string(),
            image_urls: vec!["https://img/lamp.jpg".to_string()],
        }
    }

    fn service_with(
        items: Arc<dyn ItemRepository>,
        notifications: Arc<dyn NotificationRepository>,
        embedder: MockEmbedder,
        cache: Arc<EmbeddingCache>,
    ) -> ItemService {
        ItemService::new(items, notifications, Arc::new(embedder), cache)
    }

    #[tokio::test]
    async fn test_register_item_pushes_embedding_into_cache() {
        let cache = empty_cache();
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .withf(|text| text == "Desk lamp\nWarm light")
            .times(1)
            .returning(|_| Ok(vec![0.6, 0.8]));

        let service = service_with(
            Arc::new(InMemoryItemRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
            embedder,
            cache.clone(),
        );

        let item = service.register_item("seller", create_input()).await.unwrap();

        assert!(item.has_embedding);
        assert_eq!(item.status, ItemStatus::OnSale);
        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.get(&item.id).map(|e| e.to_vec()), Some(vec![0.6, 0.8]));
    }

    #[tokio::test]
    async fn test_register_item_survives_embedding_failure() {
        let cache = empty_cache();
        let service = service_with(
            Arc::new(InMemoryItemRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
            failing_embedder(),
            cache.clone(),
        );

        let item = service.register_item("seller", create_input()).await.unwrap();

        assert!(!item.has_embedding);
        assert_eq!(cache.count().await, 0);
    }

    #[tokio::test]
    async fn test_register_item_rejects_invalid_input() {
        let mut items = MockItemRepository::new();
        items.expect_insert().never();

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().never();

        let service = service_with(
            Arc::new(items),
            Arc::new(MockNotificationRepository::new()),
            embedder,
            empty_cache(),
        );

        let mut input = create_input();
        input.image_urls.clear();

        assert!(matches!(
            service.register_item("seller", input).await,
            Err(ItemError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_item_refreshes_cache() {
        let cache = empty_cache();
        let items = Arc::new(InMemoryItemRepository::new());
        let item = items
            .insert("seller", create_input(), Some(vec![1.0, 0.0]))
            .await
            .unwrap();
        cache.set(item.id.clone(), vec![1.0, 0.0]).await;

        let service = service_with(
            items.clone(),
            Arc::new(InMemoryNotificationRepository::new()),
            embedder_returning(vec![0.0, 1.0]),
            cache.clone(),
        );

        let updated = service
            .update_item(UpdateItem {
                item_id: item.id.clone(),
                user_id: "seller".to_string(),
                name: "Floor lamp".to_string(),
                price: 3000,
                description: "Tall".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Floor lamp");
        assert_eq!(items.embedding_of(&item.id).await, Some(vec![0.0, 1.0]));
        assert_eq!(
            cache.snapshot().await.get(&item.id).map(|e| e.to_vec()),
            Some(vec![0.0, 1.0])
        );
    }

    #[tokio::test]
    async fn test_update_item_by_other_user_is_rejected() {
        let cache = empty_cache();
        let items = Arc::new(InMemoryItemRepository::new());
        let item = items.insert("seller", create_input(), None).await.unwrap();

        let service = service_with(
            items,
            Arc::new(InMemoryNotificationRepository::new()),
            embedder_returning(vec![0.0, 1.0]),
            cache.clone(),
        );

        let result = service
            .update_item(UpdateItem {
                item_id: item.id.clone(),
                user_id: "someone-else".to_string(),
                name: "Stolen lamp".to_string(),
                price: 1,
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(ItemError::Unauthorized(_))));
        assert!(!cache.snapshot().await.contains(&item.id));
    }

    #[tokio::test]
    async fn test_purchase_item_evicts_and_notifies() {
        let cache = empty_cache();
        let items = Arc::new(InMemoryItemRepository::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let item = items
            .insert("seller", create_input(), Some(vec![1.0, 0.0]))
            .await
            .unwrap();
        cache.set(item.id.clone(), vec![1.0, 0.0]).await;

        let service = service_with(
            items.clone(),
            notifications.clone(),
            MockEmbedder::new(),
            cache.clone(),
        );

        let sold = service.purchase_item(&item.id, "buyer").await.unwrap();

        assert_eq!(sold.status, ItemStatus::Sold);
        assert_eq!(sold.buyer_id.as_deref(), Some("buyer"));
        assert!(!cache.snapshot().await.contains(&item.id));

        let inbox = notifications.for_user("seller").await;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Purchase);
        assert_eq!(inbox[0].item_id, item.id);

        assert!(matches!(
            service.purchase_item(&item.id, "late-buyer").await,
            Err(ItemError::NotAvailable(_))
        ));
        assert!(matches!(
            service.purchase_item("missing", "buyer").await,
            Err(ItemError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_purchase_succeeds_when_notification_fails() {
        let cache = empty_cache();
        let items = Arc::new(InMemoryItemRepository::new());
        let item = items
            .insert("seller", create_input(), Some(vec![1.0, 0.0]))
            .await
            .unwrap();
        cache.set(item.id.clone(), vec![1.0, 0.0]).await;

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_create()
            .times(1)
            .returning(|_| Err(ItemError::Database("connection reset".to_string())));

        let service = service_with(items, Arc::new(notifications), MockEmbedder::new(), cache.clone());

        assert!(service.purchase_item(&item.id, "buyer").await.is_ok());
        assert_eq!(cache.count().await, 0);
    }

    #[tokio::test]
    async fn test_purchase_lost_race_is_not_available() {
        let cache = empty_cache();
        let item = InMemoryItemRepository::new()
            .insert("seller", create_input(), None)
            .await
            .unwrap();

        let mut items = MockItemRepository::new();
        let snapshot = item.clone();
        items
            .expect_get()
            .returning(move |_| Ok(Some(snapshot.clone())));
        items.expect_purchase().times(1).returning(|_, _| Ok(false));

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_create().never();

        let service = service_with(Arc::new(items), Arc::new(notifications), MockEmbedder::new(), cache);

        assert!(matches!(
            service.purchase_item(&item.id, "buyer").await,
            Err(ItemError::NotAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_backfill_counts_failures_and_caches_on_sale_items() {
        let cache = empty_cache();
        let items = Arc::new(InMemoryItemRepository::new());

        let mut lamp = create_input();
        lamp.name = "Lamp".to_string();
        let lamp = items.insert("seller", lamp, None).await.unwrap();

        let mut chair = create_input();
        chair.name = "Chair".to_string();
        let chair = items.insert("seller", chair, None).await.unwrap();
        items.purchase(&chair.id, "buyer").await.unwrap();

        let mut broken = create_input();
        broken.name = "Broken".to_string();
        let broken = items.insert("seller", broken, None).await.unwrap();

        let mut embedder = MockEmbedder::new();
        embedder.expect_model_name().return_const("test-model".to_string());
        embedder.expect_embed().returning(|text| {
            if text.starts_with("Broken") {
                Err(RecommendationError::Embedding("bad request".to_string()))
            } else {
                Ok(vec![0.5, 0.5])
            }
        });

        let service = service_with(
            items.clone(),
            Arc::new(InMemoryNotificationRepository::new()),
            embedder,
            cache.clone(),
        );

        let report = service.backfill_embeddings().await.unwrap();

        assert_eq!(
            report,
            BackfillReport {
                total: 3,
                succeeded: 2,
                failed: 1
            }
        );
        let snapshot = cache.snapshot().await;
        assert!(snapshot.contains(&lamp.id));
        assert!(!snapshot.contains(&chair.id));
        assert!(!snapshot.contains(&broken.id));
        assert_eq!(items.embedding_of(&chair.id).await, Some(vec![0.5, 0.5]));
        assert!(items.embedding_of(&broken.id).await.is_none());
    }

    #[tokio::test]
    async fn test_notification_message_names_item() {
        let item = InMemoryItemRepository::new()
            .insert("seller", create_input(), None)
            .await
            .unwrap();

        let input = CreateNotification::purchase(&item);
        let notification: Notification = InMemoryNotificationRepository::new()
            .create(input)
            .await
            .unwrap();

        assert_eq!(notification.user_id, "seller");
        assert_eq!(notification.message, "Desk lamp has been purchased");
        assert!(!notification.is_read);
    }
}
