//! Configuration for the recommender

use core_config::{ConfigError, Environment, FromEnv};
use database::postgres::PostgresConfig;
use domain_recommendations::RecommendationConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub database: PostgresConfig,
    pub recommendations: RecommendationConfig,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            database: PostgresConfig::from_env()?,
            recommendations: RecommendationConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("APP_ENV", Some("production")),
                ("DATABASE_URL", Some("postgres://market:market@db:5432/market")),
                ("RECOMMEND_SIMILAR_LIMIT", None),
                ("RECOMMEND_PERSONALIZED_LIMIT", Some("10")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.environment.is_production());
                assert_eq!(config.recommendations.similar_limit, 4);
                assert_eq!(config.recommendations.personalized_limit, 10);
            },
        );
    }

    #[test]
    fn test_config_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(matches!(
                Config::from_env(),
                Err(ConfigError::MissingEnvVar(key)) if key == "DATABASE_URL"
            ));
        });
    }
}
