use domain_recommendations::RecommendationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Not authorized to update item {0}")]
    Unauthorized(String),

    #[error("Cannot update sold item {0}")]
    CannotUpdateSoldItem(String),

    #[error("Item {0} is not available for purchase")]
    NotAvailable(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ItemResult<T> = Result<T, ItemError>;

impl From<sea_orm::DbErr> for ItemError {
    fn from(err: sea_orm::DbErr) -> Self {
        ItemError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ItemError {
    fn from(err: serde_json::Error) -> Self {
        ItemError::Internal(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ItemError {
    fn from(err: validator::ValidationErrors) -> Self {
        ItemError::Validation(err.to_string())
    }
}

impl From<RecommendationError> for ItemError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::Store(msg) => ItemError::Database(msg),
            other => ItemError::Internal(other.to_string()),
        }
    }
}
