//! PostgreSQL connectivity for the marketplace backend
//!
//! Wraps SeaORM connection setup with pool configuration loaded from the
//! environment, startup retry with exponential backoff, migration running and
//! a `SELECT 1` health probe.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "market-recommender").await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};
