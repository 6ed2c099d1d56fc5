use async_trait::async_trait;
use serde_json::Value;

use super::error::StoreError;
use super::types::{AttributePath, Item, Key, QueryPage, QueryRequest, TransactWrite, WriteRequest};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Maximum number of requests accepted by one batched write.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Maximum number of keys accepted by one batched read.
pub const MAX_BATCH_GET_ITEMS: usize = 100;

/// Boundary to a partitioned, sorted key-value store.
///
/// Point reads are strongly consistent. Queries return a
/// `last_evaluated_key` while more pages may exist and omit it once the
/// key range is exhausted.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Gets one item by its exact primary key.
    async fn get_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>>;

    /// Gets up to [`MAX_BATCH_GET_ITEMS`] items by key. Missing keys are skipped.
    async fn batch_get_items(&self, table: &str, keys: &[Key]) -> StoreResult<Vec<Item>>;

    /// Runs one page of an equality or range query.
    async fn query(&self, request: &QueryRequest) -> StoreResult<QueryPage>;

    /// Inserts or fully replaces an item.
    async fn put_item(&self, table: &str, item: Item) -> StoreResult<()>;

    /// Sets one attribute (possibly nested) of the item at `key`.
    ///
    /// Fails with [`StoreError::NotFound`] when no item exists at `key`.
    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        path: &AttributePath,
        value: Value,
    ) -> StoreResult<()>;

    /// Applies up to [`MAX_BATCH_WRITE_ITEMS`] puts and deletes.
    ///
    /// Larger batches are rejected without applying anything.
    async fn batch_write_items(&self, table: &str, requests: Vec<WriteRequest>)
        -> StoreResult<()>;

    /// Applies both operations atomically, or neither.
    async fn transact_write(&self, operations: [TransactWrite; 2]) -> StoreResult<()>;
}
