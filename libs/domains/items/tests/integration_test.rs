//! Integration tests for the Items domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - Items and their images are written in one transaction
//! - Owner and sold-status checks are enforced by the repository
//! - Purchases are conditional on the item still being on sale
//! - Writes keep the recommendation cache in step with the table

use async_trait::async_trait;
use domain_items::*;
use domain_recommendations::{
    EmbeddingCache, EmbeddingProvider, EmbeddingStore, PgRecommendationRepository,
    RecommendationResult, RecommendationService,
};
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

/// Deterministic provider: the vector depends only on the text length
struct LengthEmbedder;

#[async_trait]
impl EmbeddingProvider for LengthEmbedder {
    fn model_name(&self) -> &str {
        "length"
    }

    async fn embed(&self, text: &str) -> RecommendationResult<Vec<f32>> {
        Ok(vec![1.0, text.len() as f32 / 100.0])
    }
}

fn create_input(name: &str, images: &[&str]) -> CreateItem {
    CreateItem {
        name: name.to_string(),
        price: 1200,
        description: format!("{} in good condition", name),
        image_urls: images.iter().map(|u| u.to_string()).collect(),
    }
}

struct Fixture {
    _db: TestDatabase,
    items: Arc<PgItemRepository>,
    recommendations: Arc<PgRecommendationRepository>,
    cache: Arc<EmbeddingCache>,
    service: ItemService,
}

async fn fixture() -> Fixture {
    let db = TestDatabase::new().await;
    let items = Arc::new(PgItemRepository::new(db.connection()));
    let recommendations = Arc::new(PgRecommendationRepository::new(db.connection()));
    let cache = Arc::new(EmbeddingCache::initialize(recommendations.clone()).await);

    let service = ItemService::new(
        items.clone(),
        Arc::new(PgNotificationRepository::new(db.connection())),
        Arc::new(LengthEmbedder),
        cache.clone(),
    );

    Fixture {
        _db: db,
        items,
        recommendations,
        cache,
        service,
    }
}

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
async fn test_insert_and_get_item_with_images() {
    let f = fixture().await;
    let builder = TestDataBuilder::from_test_name("insert_and_get");
    let seller = builder.user_id();

    let created = f
        .items
        .insert(
            &seller,
            create_input("Desk lamp", &["https://img/1.jpg", "https://img/2.jpg"]),
            Some(builder.embedding(4)),
        )
        .await
        .unwrap();

    assert_eq!(created.status, ItemStatus::OnSale);
    assert!(created.has_embedding);

    let fetched = assert_some(f.items.get(&created.id).await.unwrap(), "created item");
    assert_eq!(fetched.name, "Desk lamp");
    assert_eq!(fetched.user_id, seller);
    assert_eq!(fetched.image_urls, vec!["https://img/1.jpg", "https://img/2.jpg"]);

    let stored = assert_some(
        f.recommendations.load_embedding(&created.id).await.unwrap(),
        "stored embedding",
    );
    assert_eq!(stored.to_vec(), builder.embedding(4));
}

#[tokio::test]
async fn test_update_rules_are_enforced() {
    let f = fixture().await;
    let item = f
        .items
        .insert("seller", create_input("Chair", &["https://img/c.jpg"]), None)
        .await
        .unwrap();

    let update = |user_id: &str| UpdateItem {
        item_id: item.id.clone(),
        user_id: user_id.to_string(),
        name: "Oak chair".to_string(),
        price: 2500,
        description: "Solid oak".to_string(),
    };

    assert!(matches!(
        f.items.update(update("intruder"), None).await,
        Err(ItemError::Unauthorized(_))
    ));

    let updated = f.items.update(update("seller"), Some(vec![0.1, 0.9])).await.unwrap();
    assert_eq!(updated.name, "Oak chair");
    assert_eq!(updated.price, 2500);
    assert!(updated.has_embedding);
    assert_eq!(updated.image_urls, vec!["https://img/c.jpg"]);

    assert!(f.items.purchase(&item.id, "buyer").await.unwrap());
    assert!(matches!(
        f.items.update(update("seller"), None).await,
        Err(ItemError::CannotUpdateSoldItem(_))
    ));

    let mut missing = update("seller");
    missing.item_id = "missing".to_string();
    assert!(matches!(
        f.items.update(missing, None).await,
        Err(ItemError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_purchase_is_conditional() {
    let f = fixture().await;
    let item = f
        .items
        .insert("seller", create_input("Bike", &["https://img/b.jpg"]), None)
        .await
        .unwrap();

    assert!(f.items.purchase(&item.id, "buyer-1").await.unwrap());
    assert!(!f.items.purchase(&item.id, "buyer-2").await.unwrap());

    let sold = assert_some(f.items.get(&item.id).await.unwrap(), "sold item");
    assert_eq!(sold.status, ItemStatus::Sold);
    assert_eq!(sold.buyer_id.as_deref(), Some("buyer-1"));
}

// ============================================================================
// Service Tests
// ============================================================================

#[tokio::test]
async fn test_write_paths_keep_cache_in_step() {
    let f = fixture().await;

    let lamp = f
        .service
        .register_item("seller", create_input("Lamp", &["https://img/l.jpg"]))
        .await
        .unwrap();
    let sofa = f
        .service
        .register_item("seller", create_input("Sofa", &["https://img/s.jpg"]))
        .await
        .unwrap();
    assert_eq!(f.cache.count().await, 2);

    let recommendations = RecommendationService::new(
        f.cache.clone(),
        f.recommendations.clone(),
        f.recommendations.clone(),
        f.recommendations.clone(),
    );

    let similar = recommendations.similar_items(&lamp.id, 4).await.unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].id, sofa.id);
    assert_eq!(similar[0].image_url, "https://img/s.jpg");

    f.service.purchase_item(&sofa.id, "buyer").await.unwrap();
    assert_eq!(f.cache.count().await, 1);
    assert!(recommendations.similar_items(&lamp.id, 4).await.unwrap().is_empty());

    // A reload from the table agrees with the incrementally maintained cache
    let before = f.cache.snapshot().await.into_map();
    f.cache.reload().await.unwrap();
    assert_eq!(f.cache.snapshot().await.into_map(), before);
}

#[tokio::test]
async fn test_backfill_fills_missing_embeddings() {
    let f = fixture().await;

    let pending = f
        .items
        .insert("seller", create_input("Table", &["https://img/t.jpg"]), None)
        .await
        .unwrap();
    let sold = f
        .items
        .insert("seller", create_input("Stool", &["https://img/st.jpg"]), None)
        .await
        .unwrap();
    f.items.purchase(&sold.id, "buyer").await.unwrap();

    let report = f.service.backfill_embeddings().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert!(f.items.items_missing_embeddings().await.unwrap().is_empty());

    let snapshot = f.cache.snapshot().await;
    assert!(snapshot.contains(&pending.id));
    assert!(!snapshot.contains(&sold.id));
}
