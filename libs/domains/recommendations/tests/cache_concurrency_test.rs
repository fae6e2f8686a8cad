//! Concurrent access to the embedding cache
//!
//! Many tasks write and read at once; every snapshot must stay internally
//! consistent and the final state must reflect every write.

use domain_recommendations::*;
use futures::future::join_all;
use std::sync::Arc;

fn summary(id: &str) -> ItemSummary {
    ItemSummary {
        id: id.to_string(),
        name: format!("item {}", id),
        price: 500,
        image_url: String::new(),
        status: ItemStatus::OnSale,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_and_readers() {
    let store = Arc::new(InMemoryMarketStore::new());
    for i in 0..50 {
        let id = format!("seed-{}", i);
        store.put_item(summary(&id), Some(vec![1.0, i as f32])).await;
    }

    let cache = Arc::new(EmbeddingCache::initialize(store.clone()).await);
    assert_eq!(cache.count().await, 50);

    let mut tasks = Vec::new();

    // Writers add new items and remove the seeded ones
    for worker in 0..8 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..100 {
                cache.set(format!("w{}-{}", worker, i), vec![0.5, i as f32]).await;
                if i < 50 && i % 8 == worker {
                    cache.delete(&format!("seed-{}", i)).await;
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    // Readers hold snapshots across yields and check they never change underneath
    for _ in 0..8 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..50 {
                let snapshot = cache.snapshot().await;
                let before = snapshot.len();
                let keys: Vec<ItemId> = snapshot.iter().map(|(id, _)| id.clone()).collect();

                tokio::task::yield_now().await;

                assert_eq!(snapshot.len(), before);
                assert!(keys.iter().all(|id| snapshot.contains(id)));
                assert!(snapshot.iter().all(|(_, e)| e.len() == 2));
            }
        }));
    }

    for result in join_all(tasks).await {
        result.unwrap();
    }

    let final_state = cache.snapshot().await;
    assert_eq!(final_state.len(), 8 * 100);
    assert!(final_state.iter().all(|(id, _)| id.starts_with('w')));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reload_during_queries() {
    let store = Arc::new(InMemoryMarketStore::new());
    for i in 0..20 {
        let id = format!("item-{}", i);
        store.put_item(summary(&id), Some(vec![1.0, i as f32 / 10.0])).await;
    }

    let cache = Arc::new(EmbeddingCache::initialize(store.clone()).await);
    let service = Arc::new(RecommendationService::new(
        cache.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));

    let reloader = {
        let cache = cache.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                let report = cache.reload().await.unwrap();
                assert_eq!(report.loaded, 20);
            }
        })
    };

    let queries: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    let items = service.similar_items("item-0", 4).await.unwrap();
                    assert_eq!(items.len(), 4);
                    assert!(items.iter().all(|i| i.id != "item-0"));
                }
            })
        })
        .collect();

    reloader.await.unwrap();
    for result in join_all(queries).await {
        result.unwrap();
    }
}
