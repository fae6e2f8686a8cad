//! Items Domain
//!
//! Marketplace write paths: listing, editing and purchasing items, plus the
//! embedding backfill. Each write keeps the recommendation cache in step with
//! PostgreSQL.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐      embed(name + description)   ┌───────────────────┐
//! │ ItemService │ ───────────────────────────────► │ EmbeddingProvider │
//! └──────┬──────┘                                  └───────────────────┘
//!        │ set / delete
//!        ├─────────────────────► EmbeddingCache (domain_recommendations)
//!        │
//! ┌──────▼──────────────────────────────┐
//! │ ItemRepository · NotificationRepo   │  ← traits (PostgreSQL / in-memory)
//! └─────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_items::{CreateItem, InMemoryItemRepository, InMemoryNotificationRepository, ItemService};
//! use domain_recommendations::{EmbeddingCache, GeminiProvider, InMemoryMarketStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(EmbeddingCache::new(Arc::new(InMemoryMarketStore::new())));
//! let service = ItemService::new(
//!     Arc::new(InMemoryItemRepository::new()),
//!     Arc::new(InMemoryNotificationRepository::new()),
//!     Arc::new(GeminiProvider::from_env()?),
//!     cache,
//! );
//!
//! let item = service
//!     .register_item(
//!         "seller-1",
//!         CreateItem {
//!             name: "Desk lamp".to_string(),
//!             price: 1500,
//!             description: "Warm light".to_string(),
//!             image_urls: vec!["https://img.example/lamp.jpg".to_string()],
//!         },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{ItemError, ItemResult};
pub use models::{
    BackfillReport, CreateItem, CreateNotification, EmbeddingCandidate, Item, ItemStatus,
    Notification, NotificationKind, UpdateItem,
};
pub use postgres::{PgItemRepository, PgNotificationRepository};
pub use repository::{
    InMemoryItemRepository, InMemoryNotificationRepository, ItemRepository, NotificationRepository,
};
pub use service::ItemService;
