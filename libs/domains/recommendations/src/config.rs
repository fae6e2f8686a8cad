use core_config::{ConfigError, FromEnv, env_parse};

pub const DEFAULT_SIMILAR_LIMIT: usize = 4;
pub const DEFAULT_PERSONALIZED_LIMIT: usize = 20;

/// Result sizes used when a caller does not ask for a specific limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationConfig {
    pub similar_limit: usize,
    pub personalized_limit: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            similar_limit: DEFAULT_SIMILAR_LIMIT,
            personalized_limit: DEFAULT_PERSONALIZED_LIMIT,
        }
    }
}

impl FromEnv for RecommendationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            similar_limit: env_parse("RECOMMEND_SIMILAR_LIMIT", "4")?,
            personalized_limit: env_parse("RECOMMEND_PERSONALIZED_LIMIT", "20")?,
        })
    }
}
