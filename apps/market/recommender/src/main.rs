//! Market Recommender
//!
//! Command-line entry point for the marketplace recommendation engine. Wires
//! PostgreSQL, the embedding cache and the ranking services together and
//! prints results as JSON.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::DatabaseConnection;
use domain_items::{ItemService, PgItemRepository, PgNotificationRepository};
use domain_recommendations::{
    EmbeddingCache, GeminiProvider, PgRecommendationRepository, RecommendationService,
};
use eyre::Result;
use serde::Serialize;
use tracing::info;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "market-recommender")]
#[command(about = "Vector recommendations for marketplace items")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Items similar to the given item
    Similar {
        item_id: String,

        /// Maximum number of results (default: RECOMMEND_SIMILAR_LIMIT)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Recommendations based on a user's likes
    Personalized {
        user_id: String,

        /// Maximum number of results (default: RECOMMEND_PERSONALIZED_LIMIT)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show embedding cache statistics
    Stats {
        /// Reload the cache from the database first
        #[arg(short, long)]
        reload: bool,
    },

    /// Generate embeddings for items that have none
    Backfill,
}

#[derive(Serialize)]
struct CacheStats {
    database_healthy: bool,
    database_response_ms: u64,
    cached: usize,
    skipped: Vec<domain_recommendations::SkippedEmbedding>,
    reload_ms: Option<u128>,
}

/// Load the embedding cache and build the read-side service around it
async fn recommendation_service(
    db: &DatabaseConnection,
) -> (RecommendationService, Arc<EmbeddingCache>) {
    let repository = Arc::new(PgRecommendationRepository::new(db.clone()));
    let cache = Arc::new(EmbeddingCache::initialize(repository.clone()).await);
    let service = RecommendationService::new(
        cache.clone(),
        repository.clone(),
        repository.clone(),
        repository,
    );
    (service, cache)
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let cli = Cli::parse();

    info!("Connecting to database...");
    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("Database connection failed: {}", e))?;

    match cli.command {
        Commands::Migrate => {
            database::postgres::run_migrations::<migration::Migrator>(&db, "market-recommender")
                .await
                .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;
            info!("Migrations applied");
        }
        Commands::Similar { item_id, limit } => {
            let limit = limit.unwrap_or(config.recommendations.similar_limit);
            let (recommendations, _) = recommendation_service(&db).await;
            let items = recommendations.similar_items(&item_id, limit).await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Commands::Personalized { user_id, limit } => {
            let limit = limit.unwrap_or(config.recommendations.personalized_limit);
            let (recommendations, _) = recommendation_service(&db).await;
            let items = recommendations
                .personalized_recommendations(&user_id, limit)
                .await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Commands::Stats { reload } => {
            let health = database::postgres::check_health_detailed(&db).await;
            if let Some(message) = &health.message {
                tracing::warn!(error = %message, "Database health check failed");
            }

            let (_, cache) = recommendation_service(&db).await;
            let (cached, skipped, reload_ms) = if reload {
                let report = cache.reload().await?;
                (
                    report.loaded,
                    report.skipped,
                    Some(report.elapsed.as_millis()),
                )
            } else {
                (cache.count().await, Vec::new(), None)
            };

            let stats = CacheStats {
                database_healthy: health.healthy,
                database_response_ms: health.response_time_ms,
                cached,
                skipped,
                reload_ms,
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Backfill => {
            let embedder = GeminiProvider::from_env()?;
            let (_, cache) = recommendation_service(&db).await;
            let items = ItemService::new(
                Arc::new(PgItemRepository::new(db.clone())),
                Arc::new(PgNotificationRepository::new(db)),
                Arc::new(embedder),
                cache,
            );

            let report = items.backfill_embeddings().await?;
            info!(
                total = report.total,
                succeeded = report.succeeded,
                failed = report.failed,
                "Backfill finished"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
