use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::RecommendationResult;
use crate::models::{Embedding, ItemId, SkippedEmbedding};
use crate::repository::EmbeddingStore;

type EmbeddingMap = HashMap<ItemId, Embedding>;

/// Outcome of a full reload
#[derive(Debug, Clone)]
pub struct ReloadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedEmbedding>,
    pub elapsed: Duration,
}

/// Process-wide mirror of every on-sale item's embedding.
///
/// Readers take an [`EmbeddingSnapshot`] which stays consistent for its whole
/// lifetime. Writers copy the map only while a snapshot of the previous
/// version is still alive; otherwise they mutate in place.
pub struct EmbeddingCache {
    store: Arc<dyn EmbeddingStore>,
    entries: RwLock<Arc<EmbeddingMap>>,
}

impl EmbeddingCache {
    /// Create an empty cache; call [`reload`](Self::reload) to populate it
    pub fn new(store: Arc<dyn EmbeddingStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Create the cache and perform the initial load.
    ///
    /// A failed load is logged and leaves the cache empty; recommendations
    /// then degrade to empty results until the next successful reload.
    pub async fn initialize(store: Arc<dyn EmbeddingStore>) -> Self {
        let cache = Self::new(store);

        match cache.reload().await {
            Ok(report) => {
                tracing::info!(
                    loaded = report.loaded,
                    skipped = report.skipped.len(),
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Embedding cache initialized"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Initial embedding load failed, starting with an empty cache");
            }
        }

        cache
    }

    /// Replace the whole cache with a fresh copy from the store.
    ///
    /// On failure the previous contents are kept untouched.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> RecommendationResult<ReloadReport> {
        let started = Instant::now();

        // Read outside the lock so queries keep running during the load
        let load = self.store.load_all_on_sale_embeddings().await?;
        let loaded = load.embeddings.len();

        {
            let mut entries = self.entries.write().await;
            *entries = Arc::new(load.embeddings);
        }

        for skipped in &load.skipped {
            tracing::debug!(item_id = %skipped.item_id, reason = %skipped.reason, "Embedding skipped during reload");
        }

        let report = ReloadReport {
            loaded,
            skipped: load.skipped,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Embedding cache reloaded"
        );

        Ok(report)
    }

    /// Point-in-time view of the cache contents
    pub async fn snapshot(&self) -> EmbeddingSnapshot {
        let entries = self.entries.read().await;
        EmbeddingSnapshot {
            entries: Arc::clone(&*entries),
        }
    }

    /// Insert or replace one item's embedding.
    ///
    /// Empty vectors are ignored and leave any existing entry in place.
    /// Returns whether the cache changed.
    pub async fn set(&self, item_id: impl Into<ItemId>, embedding: impl Into<Embedding>) -> bool {
        let embedding = embedding.into();
        let item_id = item_id.into();

        if embedding.is_empty() {
            tracing::debug!(item_id = %item_id, "Ignoring empty embedding");
            return false;
        }

        let mut entries = self.entries.write().await;
        Arc::make_mut(&mut *entries).insert(item_id, embedding);
        true
    }

    /// Remove one item's embedding. Returns whether an entry was present.
    pub async fn delete(&self, item_id: &str) -> bool {
        let mut entries = self.entries.write().await;

        // Avoid copying the map for a key that is not there
        if !entries.contains_key(item_id) {
            return false;
        }

        Arc::make_mut(&mut *entries).remove(item_id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache").finish_non_exhaustive()
    }
}

/// Immutable view of the cache taken at one instant.
///
/// Later writes to the cache are never visible through an existing snapshot.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingSnapshot {
    entries: Arc<EmbeddingMap>,
}

impl EmbeddingSnapshot {
    pub fn get(&self, item_id: &str) -> Option<&Embedding> {
        self.entries.get(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &Embedding)> + '_ {
        self.entries.iter()
    }

    /// Take ownership of the underlying map, copying only if it is still shared
    pub fn into_map(self) -> HashMap<ItemId, Embedding> {
        Arc::unwrap_or_clone(self.entries)
    }
}
