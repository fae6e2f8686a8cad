use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RecommendationResult<T> = Result<T, RecommendationError>;

impl From<sea_orm::DbErr> for RecommendationError {
    fn from(err: sea_orm::DbErr) -> Self {
        RecommendationError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for RecommendationError {
    fn from(err: reqwest::Error) -> Self {
        RecommendationError::Embedding(err.to_string())
    }
}

impl From<serde_json::Error> for RecommendationError {
    fn from(err: serde_json::Error) -> Self {
        RecommendationError::Internal(format!("JSON error: {}", err))
    }
}

impl From<core_config::ConfigError> for RecommendationError {
    fn from(err: core_config::ConfigError) -> Self {
        RecommendationError::Config(err.to_string())
    }
}
