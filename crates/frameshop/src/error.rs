use frameshop_core::storage::RepositoryError;
use thiserror::Error;

/// Errors returned by the domain repositories.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("Invalid {entity}: {reason}")]
    Validation {
        entity: &'static str,
        reason: String,
    },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ShopError {
    pub(crate) fn invalid(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            entity,
            reason: reason.into(),
        }
    }
}

/// Result type for domain repository operations.
pub type Result<T> = std::result::Result<T, ShopError>;
