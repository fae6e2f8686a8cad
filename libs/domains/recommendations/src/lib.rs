//! Recommendations Domain
//!
//! In-process vector recommendations for marketplace items: an in-memory
//! embedding cache mirrored from PostgreSQL, and the cosine-similarity ranking
//! that answers "items like this one" and "items for this user" queries.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐      write paths (create / update / purchase)
//! │ RecommendationService │             │ set / delete
//! └───┬──────────┬────────┘             │
//!     │ snapshot │ rank          ┌──────▼─────────┐
//!     │          └──────────────►│ EmbeddingCache │
//!     │                          └──────┬─────────┘
//!     │ hydrate / fallback              │ bulk load / reload
//! ┌───▼──────────────────────────────────▼──┐
//! │ EmbeddingStore · ItemCatalog · Likes    │  ← traits (PostgreSQL / in-memory)
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_recommendations::{EmbeddingCache, InMemoryMarketStore, RecommendationService};
//!
//! # async fn example() -> domain_recommendations::RecommendationResult<()> {
//! let store = Arc::new(InMemoryMarketStore::new());
//! let cache = Arc::new(EmbeddingCache::initialize(store.clone()).await);
//! let service = RecommendationService::new(cache, store.clone(), store.clone(), store);
//!
//! let similar = service.similar_items("item-1", 4).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod embedding;
pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod ranking;
pub mod repository;
pub mod service;

pub use cache::{EmbeddingCache, EmbeddingSnapshot, ReloadReport};
pub use config::RecommendationConfig;
pub use embedding::{EmbeddingProvider, GeminiConfig, GeminiProvider, embedding_text};
pub use error::{RecommendationError, RecommendationResult};
pub use models::{Embedding, EmbeddingLoad, ItemId, ItemStatus, ItemSummary, SkippedEmbedding};
pub use postgres::PgRecommendationRepository;
pub use ranking::{ItemScore, cosine_similarity, mean_vector, rank};
pub use repository::{EmbeddingStore, InMemoryMarketStore, ItemCatalog, LikeRepository};
pub use service::RecommendationService;
