use thiserror::Error;

/// Errors reported by a [`KeyedStore`](super::KeyedStore) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Throttled: {0}")]
    Throttled(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Transaction canceled: {0}")]
    TransactionCanceled(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Invalid repository configuration: {0}")]
    Configuration(String),
    #[error("Table {table} requires a value for sort key '{sort_key}'")]
    MissingSortKey { table: String, sort_key: String },
    #[error("Attribute '{attribute}' is a key of table {table} and cannot be updated")]
    ImmutableKey { table: String, attribute: String },
    #[error("Missing key attribute '{attribute}' for table {table}")]
    MissingKey { table: String, attribute: String },
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Page limit must be at least 1, got {0}")]
    InvalidLimit(usize),
    #[error("Invalid attribute path: '{0}'")]
    InvalidPath(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error(
        "{operation}: {} of {total_chunks} chunks failed, the others were applied: {source}",
        .failed_chunks.len()
    )]
    BatchWrite {
        operation: &'static str,
        failed_chunks: Vec<usize>,
        total_chunks: usize,
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sort_key_display() {
        let error = RepositoryError::MissingSortKey {
            table: "dev-order".to_string(),
            sort_key: "timestamp".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Table dev-order requires a value for sort key 'timestamp'"
        );
    }

    #[test]
    fn test_immutable_key_display() {
        let error = RepositoryError::ImmutableKey {
            table: "dev-customer".to_string(),
            attribute: "phone".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Attribute 'phone' is a key of table dev-customer and cannot be updated"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let error: RepositoryError = StoreError::Throttled("slow down".to_string()).into();
        assert_eq!(error.to_string(), "Throttled: slow down");
        assert_eq!(
            error,
            RepositoryError::Store(StoreError::Throttled("slow down".to_string()))
        );
    }

    #[test]
    fn test_batch_write_display() {
        let error = RepositoryError::BatchWrite {
            operation: "batch_put",
            failed_chunks: vec![1],
            total_chunks: 3,
            source: StoreError::QueryFailed("boom".to_string()),
        };
        assert_eq!(
            error.to_string(),
            "batch_put: 1 of 3 chunks failed, the others were applied: Query failed: boom"
        );
    }
}
