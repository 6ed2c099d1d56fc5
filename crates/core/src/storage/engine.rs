//! Generic repository engine.
//!
//! [`Repository`] maps one typed collection onto a [`KeyedStore`]. It owns
//! the key layout of the collection and translates typed calls into store
//! requests: exact-key reads, drained and paginated queries, chunked batch
//! writes, and the transactional key replacement.

use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::chunk::chunk;
use super::cursor::{Cursor, CursorPayload};
use super::error::{RepositoryError, Result, StoreError};
use super::schema::{KeyLayout, SortKey};
use super::traits::{KeyedStore, MAX_BATCH_GET_ITEMS, MAX_BATCH_WRITE_ITEMS};
use super::types::{
    AttributePath, Direction, Filter, Item, Key, KeyCondition, KeyPart, KeyValue, KeyValues, Page,
    QueryRequest, SortCondition, TransactWrite, WriteRequest,
};

/// Page size used when callers have no preference.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Reads one key attribute value from an entity.
pub type KeyExtractor<T> = fn(&T) -> Option<KeyValue>;

/// A key attribute name paired with the function reading it from an entity.
pub struct KeyField<T> {
    name: String,
    value_of: KeyExtractor<T>,
}

impl<T> KeyField<T> {
    pub fn new(name: impl Into<String>, value_of: KeyExtractor<T>) -> Self {
        Self {
            name: name.into(),
            value_of,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for KeyField<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            value_of: self.value_of,
        }
    }
}

/// Key layout of a collection together with its key extractors.
pub struct KeySchema<T> {
    partition: KeyField<T>,
    sort: Option<KeyField<T>>,
}

impl<T> KeySchema<T> {
    /// A collection keyed by its partition key alone.
    pub fn partition(name: impl Into<String>, value_of: KeyExtractor<T>) -> Self {
        Self {
            partition: KeyField::new(name, value_of),
            sort: None,
        }
    }

    /// Adds a sort key to the collection.
    pub fn sorted_by(mut self, name: impl Into<String>, value_of: KeyExtractor<T>) -> Self {
        self.sort = Some(KeyField::new(name, value_of));
        self
    }

    pub fn layout(&self) -> KeyLayout {
        KeyLayout {
            partition_key: self.partition.name.clone(),
            sort_key: match &self.sort {
                Some(field) => SortKey::Sorted(field.name.clone()),
                None => SortKey::Unsorted,
            },
        }
    }
}

impl<T> Clone for KeySchema<T> {
    fn clone(&self) -> Self {
        Self {
            partition: self.partition.clone(),
            sort: self.sort.clone(),
        }
    }
}

/// Secondary index to query, with the attribute it is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexKey<'a> {
    pub index: &'a str,
    pub attribute: &'a str,
}

impl<'a> IndexKey<'a> {
    pub fn new(index: &'a str, attribute: &'a str) -> Self {
        Self { index, attribute }
    }
}

/// Typed access to one collection of a [`KeyedStore`].
pub struct Repository<T> {
    store: Arc<dyn KeyedStore>,
    table: String,
    schema: KeySchema<T>,
    layout: KeyLayout,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Binds a collection. Fails if the table or a key attribute name is empty.
    pub fn new(
        store: Arc<dyn KeyedStore>,
        table: impl Into<String>,
        schema: KeySchema<T>,
    ) -> Result<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(RepositoryError::Configuration(
                "table name is empty".to_string(),
            ));
        }
        if schema.partition.name.trim().is_empty() {
            return Err(RepositoryError::Configuration(format!(
                "partition key name of table {table} is empty"
            )));
        }
        if let Some(sort) = &schema.sort {
            if sort.name.trim().is_empty() {
                return Err(RepositoryError::Configuration(format!(
                    "sort key name of table {table} is empty"
                )));
            }
            if sort.name == schema.partition.name {
                return Err(RepositoryError::Configuration(format!(
                    "table {table} uses '{}' as both partition and sort key",
                    sort.name
                )));
            }
        }

        let layout = schema.layout();
        Ok(Self {
            store,
            table,
            schema,
            layout,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    // ------------------------------------------------------------------
    // Point operations
    // ------------------------------------------------------------------

    /// Gets the entity stored at the exact key.
    pub async fn get(
        &self,
        partition: impl Into<KeyValue>,
        sort: Option<KeyValue>,
    ) -> Result<Option<T>> {
        let key = self.key(partition.into(), sort)?;
        let item = self
            .store
            .get_item(&self.table, &key)
            .await
            .map_err(|e| self.store_failure("get", e))?;
        item.map(|item| self.from_item(item)).transpose()
    }

    /// Gets many entities of a collection without sort key.
    ///
    /// Keys are read in batches of [`MAX_BATCH_GET_ITEMS`]. Missing keys are
    /// skipped and the result order is unspecified.
    pub async fn get_by_partition_keys(&self, partitions: &[KeyValue]) -> Result<Vec<T>> {
        if let Some(sort) = &self.schema.sort {
            return Err(self.missing_sort_key(sort));
        }

        let keys = partitions
            .iter()
            .map(|partition| self.key(partition.clone(), None))
            .collect::<Result<Vec<_>>>()?;
        let batches = chunk(keys, MAX_BATCH_GET_ITEMS)
            .into_iter()
            .map(|keys| async move { self.store.batch_get_items(&self.table, &keys).await });
        let pages = try_join_all(batches)
            .await
            .map_err(|e| self.store_failure("get_by_partition_keys", e))?;

        self.from_items(pages.into_iter().flatten().collect())
    }

    /// Returns the first entity whose `attribute` equals `value` on `index`.
    pub async fn get_by_secondary_index(
        &self,
        index: &str,
        attribute: &str,
        value: impl Into<KeyValue>,
    ) -> Result<Option<T>> {
        let mut request = self.scoped_request(
            Some(IndexKey::new(index, attribute)),
            value.into(),
            Direction::Ascending,
        );
        request.limit = Some(1);

        let page = self
            .store
            .query(&request)
            .await
            .map_err(|e| self.store_failure("get_by_secondary_index", e))?;
        page.items
            .into_iter()
            .next()
            .map(|item| self.from_item(item))
            .transpose()
    }

    /// Looks an entity up through the conventional `uuid` index.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<T>> {
        self.get_by_secondary_index("uuid", "uuid", uuid).await
    }

    /// Looks an entity up through the conventional `shortId` index.
    pub async fn get_by_short_id(&self, short_id: &str) -> Result<Option<T>> {
        self.get_by_secondary_index("shortId", "shortId", short_id)
            .await
    }

    /// Inserts or fully replaces an entity.
    pub async fn put(&self, entity: &T) -> Result<()> {
        let item = self.to_item(entity)?;
        self.store
            .put_item(&self.table, item)
            .await
            .map_err(|e| self.store_failure("put", e))
    }

    /// Sets one top-level attribute. Key attributes cannot be updated.
    pub async fn update_field(
        &self,
        partition: impl Into<KeyValue>,
        field: &str,
        value: impl Serialize,
        sort: Option<KeyValue>,
    ) -> Result<()> {
        if field.is_empty() {
            return Err(RepositoryError::InvalidPath(String::new()));
        }
        self.ensure_mutable(field)?;
        self.update_path(
            "update_field",
            partition.into(),
            AttributePath::attribute(field),
            value,
            sort,
        )
        .await
    }

    /// Sets one attribute addressed by a dotted path.
    pub async fn update_nested_field(
        &self,
        partition: impl Into<KeyValue>,
        path: &str,
        value: impl Serialize,
        sort: Option<KeyValue>,
    ) -> Result<()> {
        let path = AttributePath::parse(path)?;
        if path.is_top_level() {
            self.ensure_mutable(&path.segments()[0])?;
        }
        self.update_path("update_nested_field", partition.into(), path, value, sort)
            .await
    }

    // ------------------------------------------------------------------
    // Collection queries
    // ------------------------------------------------------------------

    /// Gets every entity of a partition, ordered by sort key.
    pub async fn get_by_partition_key(
        &self,
        partition: impl Into<KeyValue>,
        direction: Direction,
    ) -> Result<Vec<T>> {
        let request = self.scoped_request(None, partition.into(), direction);
        self.drain("get_by_partition_key", request).await
    }

    /// Gets one page of a partition and the cursor to the next page.
    pub async fn get_by_partition_key_paginated(
        &self,
        partition: impl Into<KeyValue>,
        direction: Direction,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> Result<Page<T>> {
        if limit == 0 {
            return Err(RepositoryError::InvalidLimit(limit));
        }
        let partition = partition.into();
        let mut request = self.scoped_request(None, partition.clone(), direction);
        request.limit = Some(limit);

        if let Some(cursor) = cursor {
            let payload = CursorPayload::decode(cursor)?;
            payload.ensure_scope(&self.table, &partition, direction)?;
            request.exclusive_start_key = Some(self.cursor_start_key(payload)?.to_item());
        }

        let page = self
            .store
            .query(&request)
            .await
            .map_err(|e| self.store_failure("get_by_partition_key_paginated", e))?;

        let next_cursor = match &page.last_evaluated_key {
            Some(last) => {
                let key = self.layout.key_of(last).ok_or_else(|| {
                    RepositoryError::Serialization(format!(
                        "store returned a continuation key without the keys of table {}",
                        self.table
                    ))
                })?;
                Some(
                    CursorPayload::new(
                        &self.table,
                        direction,
                        key.partition.value,
                        key.sort.map(|sort| sort.value),
                    )
                    .encode()?,
                )
            }
            None => None,
        };

        Ok(Page {
            elements: self.from_items(page.items)?,
            next_cursor,
        })
    }

    /// Gets the entities of a partition whose sort key lies in `[low, high]`.
    ///
    /// Collections without sort key yield nothing.
    pub async fn get_by_sort_key_range(
        &self,
        partition: impl Into<KeyValue>,
        low: impl Into<KeyValue>,
        high: impl Into<KeyValue>,
    ) -> Result<Vec<T>> {
        let Some(sort) = &self.schema.sort else {
            return Ok(Vec::new());
        };

        let mut request = self.scoped_request(None, partition.into(), Direction::Ascending);
        request.condition.sort = Some((
            sort.name.clone(),
            SortCondition::Between {
                low: low.into(),
                high: high.into(),
            },
        ));
        self.drain("get_by_sort_key_range", request).await
    }

    /// Gets every entity whose `attribute` equals `value` on `index`.
    pub async fn get_by_secondary_index_ordered(
        &self,
        index: &str,
        attribute: &str,
        value: impl Into<KeyValue>,
        direction: Direction,
    ) -> Result<Vec<T>> {
        let request =
            self.scoped_request(Some(IndexKey::new(index, attribute)), value.into(), direction);
        self.drain("get_by_secondary_index_ordered", request).await
    }

    /// Gets the entities of a partition (or index partition) whose `field`
    /// contains `substring`. The filter runs in the store.
    pub async fn search(
        &self,
        partition: impl Into<KeyValue>,
        substring: &str,
        field: &str,
        direction: Direction,
        index: Option<IndexKey<'_>>,
    ) -> Result<Vec<T>> {
        if field.is_empty() {
            return Err(RepositoryError::InvalidPath(String::new()));
        }
        self.search_path(
            "search",
            partition.into(),
            substring,
            AttributePath::attribute(field),
            direction,
            index,
        )
        .await
    }

    /// Same as [`search`](Self::search) over a dotted attribute path.
    pub async fn search_nested(
        &self,
        partition: impl Into<KeyValue>,
        substring: &str,
        path: &str,
        direction: Direction,
        index: Option<IndexKey<'_>>,
    ) -> Result<Vec<T>> {
        let path = AttributePath::parse(path)?;
        self.search_path(
            "search_nested",
            partition.into(),
            substring,
            path,
            direction,
            index,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Bulk and atomic operations
    // ------------------------------------------------------------------

    /// Writes entities in chunks of [`MAX_BATCH_WRITE_ITEMS`], concurrently.
    ///
    /// Chunks are independent: when one fails the others stay applied and the
    /// error lists the failed chunk indexes.
    pub async fn batch_put(&self, entities: &[T]) -> Result<()> {
        let requests = entities
            .iter()
            .map(|entity| self.to_item(entity).map(WriteRequest::Put))
            .collect::<Result<Vec<_>>>()?;
        self.write_chunked("batch_put", requests).await
    }

    /// Deletes entities by key with the same chunking contract as
    /// [`batch_put`](Self::batch_put).
    pub async fn batch_delete(&self, keys: &[KeyValues]) -> Result<()> {
        let requests = keys
            .iter()
            .map(|key| {
                self.key(key.partition.clone(), key.sort.clone())
                    .map(WriteRequest::Delete)
            })
            .collect::<Result<Vec<_>>>()?;
        self.write_chunked("batch_delete", requests).await
    }

    /// Moves an entity to a new key: deletes `old` and puts `new` atomically.
    pub async fn replace_key(&self, old: &T, new: &T) -> Result<()> {
        let old_key = self.key_of(old)?;
        let new_key = self.key_of(new)?;
        if old_key == new_key {
            return self.put(new).await;
        }

        let item = self.to_item(new)?;
        self.store
            .transact_write([
                TransactWrite::Delete {
                    table: self.table.clone(),
                    key: old_key,
                },
                TransactWrite::Put {
                    table: self.table.clone(),
                    item,
                },
            ])
            .await
            .map_err(|e| self.store_failure("replace_key", e))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn key(&self, partition: KeyValue, sort: Option<KeyValue>) -> Result<Key> {
        let sort = match &self.schema.sort {
            None => None,
            Some(field) => match sort {
                Some(value) if !value.is_empty() => Some(KeyPart::new(field.name.clone(), value)),
                _ => return Err(self.missing_sort_key(field)),
            },
        };
        Ok(Key {
            partition: KeyPart::new(self.schema.partition.name.clone(), partition),
            sort,
        })
    }

    fn key_of(&self, entity: &T) -> Result<Key> {
        let partition = extract(&self.schema.partition, entity).ok_or_else(|| {
            RepositoryError::MissingKey {
                table: self.table.clone(),
                attribute: self.schema.partition.name.clone(),
            }
        })?;
        let sort = match &self.schema.sort {
            None => None,
            Some(field) => Some(extract(field, entity).ok_or_else(|| {
                RepositoryError::MissingKey {
                    table: self.table.clone(),
                    attribute: field.name.clone(),
                }
            })?),
        };
        Ok(Key { partition, sort })
    }

    fn cursor_start_key(&self, payload: CursorPayload) -> Result<Key> {
        if self.schema.sort.is_some() && payload.sort.is_none() {
            return Err(RepositoryError::InvalidCursor(
                "cursor carries no sort key value".to_string(),
            ));
        }
        self.key(payload.partition, payload.sort)
    }

    fn missing_sort_key(&self, field: &KeyField<T>) -> RepositoryError {
        RepositoryError::MissingSortKey {
            table: self.table.clone(),
            sort_key: field.name.clone(),
        }
    }

    fn ensure_mutable(&self, attribute: &str) -> Result<()> {
        if self.layout.is_key_attribute(attribute) {
            return Err(RepositoryError::ImmutableKey {
                table: self.table.clone(),
                attribute: attribute.to_string(),
            });
        }
        Ok(())
    }

    fn to_item(&self, entity: &T) -> Result<Item> {
        let key = self.key_of(entity)?;
        let mut item = match serde_json::to_value(entity)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?
        {
            Value::Object(item) => item,
            other => {
                return Err(RepositoryError::Serialization(format!(
                    "entities of table {} must serialize to a map, got {other}",
                    self.table
                )))
            }
        };
        item.extend(key.to_item());
        Ok(item)
    }

    fn from_item(&self, item: Item) -> Result<T> {
        serde_json::from_value(Value::Object(item)).map_err(|e| {
            RepositoryError::Serialization(format!("item of table {}: {e}", self.table))
        })
    }

    fn from_items(&self, items: Vec<Item>) -> Result<Vec<T>> {
        items.into_iter().map(|item| self.from_item(item)).collect()
    }

    fn scoped_request(
        &self,
        index: Option<IndexKey<'_>>,
        value: KeyValue,
        direction: Direction,
    ) -> QueryRequest {
        let (index, attribute) = match index {
            Some(index) => (Some(index.index.to_string()), index.attribute.to_string()),
            None => (None, self.schema.partition.name.clone()),
        };
        let mut request = QueryRequest::new(
            self.table.clone(),
            KeyCondition {
                partition: KeyPart::new(attribute, value),
                sort: None,
            },
        );
        request.index = index;
        request.direction = direction;
        request
    }

    async fn update_path(
        &self,
        operation: &'static str,
        partition: KeyValue,
        path: AttributePath,
        value: impl Serialize,
        sort: Option<KeyValue>,
    ) -> Result<()> {
        let key = self.key(partition, sort)?;
        let value =
            serde_json::to_value(value).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.store
            .update_item(&self.table, &key, &path, value)
            .await
            .map_err(|e| self.store_failure(operation, e))
    }

    async fn search_path(
        &self,
        operation: &'static str,
        partition: KeyValue,
        substring: &str,
        path: AttributePath,
        direction: Direction,
        index: Option<IndexKey<'_>>,
    ) -> Result<Vec<T>> {
        let mut request = self.scoped_request(index, partition, direction);
        request.filter = Some(Filter::Contains {
            path,
            substring: substring.to_string(),
        });
        self.drain(operation, request).await
    }

    /// Follows continuation keys until the query is exhausted.
    async fn drain(&self, operation: &'static str, mut request: QueryRequest) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .query(&request)
                .await
                .map_err(|e| self.store_failure(operation, e))?;
            pages += 1;
            items.extend(page.items);

            match page.last_evaluated_key {
                Some(last) => request.exclusive_start_key = Some(last),
                None => break,
            }
        }

        tracing::debug!(
            table = %self.table,
            operation,
            pages,
            items = items.len(),
            "Drained query"
        );
        self.from_items(items)
    }

    async fn write_chunked(
        &self,
        operation: &'static str,
        requests: Vec<WriteRequest>,
    ) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }

        let chunks = chunk(requests, MAX_BATCH_WRITE_ITEMS);
        let total_chunks = chunks.len();
        tracing::debug!(table = %self.table, operation, total_chunks, "Writing batch");

        let results = join_all(
            chunks
                .into_iter()
                .map(|requests| self.store.batch_write_items(&self.table, requests)),
        )
        .await;

        let mut failed_chunks = Vec::new();
        let mut first_error = None;
        for (index, result) in results.into_iter().enumerate() {
            if let Err(error) = result {
                tracing::error!(
                    table = %self.table,
                    partition_key = %self.layout.partition_key,
                    sort_key = ?self.layout.sort_key.name(),
                    operation,
                    chunk = index,
                    total_chunks,
                    error = %error,
                    "Batch chunk failed"
                );
                failed_chunks.push(index);
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            None => Ok(()),
            Some(source) => Err(RepositoryError::BatchWrite {
                operation,
                failed_chunks,
                total_chunks,
                source,
            }),
        }
    }

    fn store_failure(&self, operation: &'static str, error: StoreError) -> RepositoryError {
        tracing::error!(
            table = %self.table,
            partition_key = %self.layout.partition_key,
            sort_key = ?self.layout.sort_key.name(),
            operation,
            error = %error,
            "Store operation failed"
        );
        RepositoryError::Store(error)
    }
}

fn extract<T>(field: &KeyField<T>, entity: &T) -> Option<KeyPart> {
    (field.value_of)(entity)
        .filter(|value| !value.is_empty())
        .map(|value| KeyPart::new(field.name.clone(), value))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::storage::traits::StoreResult;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Order {
        customer_uuid: String,
        timestamp: i64,
        short_id: String,
    }

    fn order(customer: &str, timestamp: i64) -> Order {
        Order {
            customer_uuid: customer.to_string(),
            timestamp,
            short_id: format!("S{timestamp}"),
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Get(Key),
        Query(QueryRequest),
        Put(Item),
        Update(Key, AttributePath, Value),
        BatchWrite(usize),
        Transact([TransactWrite; 2]),
    }

    /// Records every call and replays scripted query pages.
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
        pages: Mutex<VecDeque<crate::storage::QueryPage>>,
        failing_batches: Vec<usize>,
        batch_counter: Mutex<usize>,
    }

    impl RecordingStore {
        fn with_pages(pages: Vec<crate::storage::QueryPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KeyedStore for RecordingStore {
        async fn get_item(&self, _table: &str, key: &Key) -> StoreResult<Option<Item>> {
            self.calls.lock().unwrap().push(Call::Get(key.clone()));
            Ok(None)
        }

        async fn batch_get_items(&self, _table: &str, _keys: &[Key]) -> StoreResult<Vec<Item>> {
            Ok(Vec::new())
        }

        async fn query(&self, request: &QueryRequest) -> StoreResult<crate::storage::QueryPage> {
            self.calls.lock().unwrap().push(Call::Query(request.clone()));
            Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
        }

        async fn put_item(&self, _table: &str, item: Item) -> StoreResult<()> {
            self.calls.lock().unwrap().push(Call::Put(item));
            Ok(())
        }

        async fn update_item(
            &self,
            _table: &str,
            key: &Key,
            path: &AttributePath,
            value: Value,
        ) -> StoreResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(key.clone(), path.clone(), value));
            Ok(())
        }

        async fn batch_write_items(
            &self,
            _table: &str,
            requests: Vec<WriteRequest>,
        ) -> StoreResult<()> {
            let index = {
                let mut counter = self.batch_counter.lock().unwrap();
                *counter += 1;
                *counter - 1
            };
            self.calls
                .lock()
                .unwrap()
                .push(Call::BatchWrite(requests.len()));
            if self.failing_batches.contains(&index) {
                return Err(StoreError::Throttled(format!("chunk {index}")));
            }
            Ok(())
        }

        async fn transact_write(&self, operations: [TransactWrite; 2]) -> StoreResult<()> {
            self.calls.lock().unwrap().push(Call::Transact(operations));
            Ok(())
        }
    }

    fn schema() -> KeySchema<Order> {
        KeySchema::partition("customerUuid", |o: &Order| KeyValue::non_empty(&o.customer_uuid))
            .sorted_by("timestamp", |o: &Order| Some(KeyValue::Number(o.timestamp)))
    }

    fn repository(store: Arc<RecordingStore>) -> Repository<Order> {
        Repository::new(store, "dev-order", schema()).unwrap()
    }

    fn item(value: Value) -> Item {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_configuration_errors() {
        let store: Arc<dyn KeyedStore> = Arc::new(RecordingStore::default());

        let empty_table = Repository::new(store.clone(), " ", schema());
        assert!(matches!(empty_table, Err(RepositoryError::Configuration(_))));

        let empty_partition = Repository::<Order>::new(
            store.clone(),
            "dev-order",
            KeySchema::partition("", |o: &Order| KeyValue::non_empty(&o.customer_uuid)),
        );
        assert!(matches!(
            empty_partition,
            Err(RepositoryError::Configuration(_))
        ));

        let same_names = Repository::<Order>::new(
            store,
            "dev-order",
            KeySchema::partition("customerUuid", |o: &Order| {
                KeyValue::non_empty(&o.customer_uuid)
            })
            .sorted_by("customerUuid", |o: &Order| Some(KeyValue::Number(o.timestamp))),
        );
        assert!(matches!(same_names, Err(RepositoryError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_get_requires_sort_key() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let result = repo.get("C1", None).await;
        assert!(matches!(
            result,
            Err(RepositoryError::MissingSortKey { ref sort_key, .. }) if sort_key == "timestamp"
        ));

        let empty_sort = repo.get("C1", Some(KeyValue::from(""))).await;
        assert!(matches!(
            empty_sort,
            Err(RepositoryError::MissingSortKey { .. })
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_builds_full_key() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        assert_eq!(repo.get("C1", Some(100.into())).await.unwrap(), None);
        assert_eq!(
            store.calls(),
            vec![Call::Get(Key {
                partition: KeyPart::new("customerUuid", "C1"),
                sort: Some(KeyPart::new("timestamp", 100)),
            })]
        );
    }

    #[tokio::test]
    async fn test_update_field_rejects_key_attributes() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        for field in ["customerUuid", "timestamp"] {
            let result = repo
                .update_field("C1", field, "changed", Some(100.into()))
                .await;
            assert!(matches!(
                result,
                Err(RepositoryError::ImmutableKey { ref attribute, .. }) if attribute == field
            ));
        }

        let single_segment = repo
            .update_nested_field("C1", "timestamp", 5, Some(100.into()))
            .await;
        assert!(matches!(
            single_segment,
            Err(RepositoryError::ImmutableKey { .. })
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_field_and_nested_field() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        repo.update_field("C1", "status", "finished", Some(100.into()))
            .await
            .unwrap();
        repo.update_nested_field("C1", "dimensions.totalWidth", 42, Some(100.into()))
            .await
            .unwrap();

        let calls = store.calls();
        assert!(matches!(
            &calls[0],
            Call::Update(_, path, value) if path.to_string() == "status" && value == &json!("finished")
        ));
        assert!(matches!(
            &calls[1],
            Call::Update(_, path, value) if path.segments() == ["dimensions", "totalWidth"] && value == &json!(42)
        ));

        let bad_path = repo
            .update_nested_field("C1", "dimensions..x", 1, Some(100.into()))
            .await;
        assert!(matches!(bad_path, Err(RepositoryError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_put_stamps_key_attributes() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        repo.put(&order("C1", 100)).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::Put(item(json!({
                "customerUuid": "C1",
                "timestamp": 100,
                "shortId": "S100"
            })))]
        );
    }

    #[tokio::test]
    async fn test_put_without_partition_value_fails() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let result = repo.put(&order("", 100)).await;
        assert!(matches!(
            result,
            Err(RepositoryError::MissingKey { ref attribute, .. }) if attribute == "customerUuid"
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_put_chunk_counts() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let orders: Vec<Order> = (0..60).map(|i| order("C1", i)).collect();
        repo.batch_put(&orders).await.unwrap();

        let mut sizes: Vec<usize> = store
            .calls()
            .into_iter()
            .map(|call| match call {
                Call::BatchWrite(size) => size,
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![10, 25, 25]);
    }

    #[tokio::test]
    async fn test_batch_put_empty_issues_nothing() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        repo.batch_put(&[]).await.unwrap();
        repo.batch_delete(&[]).await.unwrap();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_reports_failed_chunks() {
        let store = Arc::new(RecordingStore {
            failing_batches: vec![1],
            ..Default::default()
        });
        let repo = repository(store.clone());

        let orders: Vec<Order> = (0..60).map(|i| order("C1", i)).collect();
        let result = repo.batch_put(&orders).await;

        match result {
            Err(RepositoryError::BatchWrite {
                operation,
                failed_chunks,
                total_chunks,
                source,
            }) => {
                assert_eq!(operation, "batch_put");
                assert_eq!(failed_chunks, vec![1]);
                assert_eq!(total_chunks, 3);
                assert_eq!(source, StoreError::Throttled("chunk 1".to_string()));
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(store.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_batch_delete_requires_sort_values_up_front() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let keys = vec![
            KeyValues::new("C1", Some(100.into())),
            KeyValues::new("C1", None),
        ];
        let result = repo.batch_delete(&keys).await;
        assert!(matches!(
            result,
            Err(RepositoryError::MissingSortKey { .. })
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_replace_key_is_one_transaction() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let old = order("TEMP", 100);
        let new = order("C1", 100);
        repo.replace_key(&old, &new).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::Transact([
                TransactWrite::Delete {
                    table: "dev-order".to_string(),
                    key: Key {
                        partition: KeyPart::new("customerUuid", "TEMP"),
                        sort: Some(KeyPart::new("timestamp", 100)),
                    },
                },
                TransactWrite::Put {
                    table: "dev-order".to_string(),
                    item: item(json!({
                        "customerUuid": "C1",
                        "timestamp": 100,
                        "shortId": "S100"
                    })),
                },
            ])]
        );
    }

    #[tokio::test]
    async fn test_replace_key_with_same_key_is_a_put() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let old = order("C1", 100);
        let mut new = old.clone();
        new.short_id = "NEW".to_string();
        repo.replace_key(&old, &new).await.unwrap();

        assert!(matches!(store.calls().as_slice(), [Call::Put(_)]));
    }

    #[tokio::test]
    async fn test_replace_key_missing_key() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let result = repo.replace_key(&order("", 100), &order("C1", 100)).await;
        assert!(matches!(result, Err(RepositoryError::MissingKey { .. })));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drain_follows_continuation_keys() {
        let store = Arc::new(RecordingStore::with_pages(vec![
            crate::storage::QueryPage {
                items: vec![item(json!({"customerUuid": "C1", "timestamp": 1, "shortId": "A"}))],
                last_evaluated_key: Some(item(json!({"customerUuid": "C1", "timestamp": 1}))),
            },
            crate::storage::QueryPage {
                items: vec![item(json!({"customerUuid": "C1", "timestamp": 2, "shortId": "B"}))],
                last_evaluated_key: None,
            },
        ]));
        let repo = repository(store.clone());

        let orders = repo
            .get_by_partition_key("C1", Direction::Ascending)
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        match &calls[1] {
            Call::Query(request) => assert_eq!(
                request.exclusive_start_key,
                Some(item(json!({"customerUuid": "C1", "timestamp": 1})))
            ),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_paginated_cursor_resumes_after_last_key() {
        let store = Arc::new(RecordingStore::with_pages(vec![crate::storage::QueryPage {
            items: vec![item(json!({"customerUuid": "C1", "timestamp": 300, "shortId": "A"}))],
            last_evaluated_key: Some(item(json!({"customerUuid": "C1", "timestamp": 300}))),
        }]));
        let repo = repository(store.clone());

        let page = repo
            .get_by_partition_key_paginated("C1", Direction::Descending, None, 1)
            .await
            .unwrap();
        let cursor = page.next_cursor.expect("more pages");

        repo.get_by_partition_key_paginated("C1", Direction::Descending, Some(&cursor), 1)
            .await
            .unwrap();

        let calls = store.calls();
        match &calls[1] {
            Call::Query(request) => {
                assert_eq!(request.limit, Some(1));
                assert_eq!(request.direction, Direction::Descending);
                assert_eq!(
                    request.exclusive_start_key,
                    Some(item(json!({"customerUuid": "C1", "timestamp": 300})))
                );
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_paginated_rejects_zero_limit() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let result = repo
            .get_by_partition_key_paginated("C1", Direction::Ascending, None, 0)
            .await;

        assert!(matches!(result, Err(RepositoryError::InvalidLimit(0))));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_paginated_rejects_foreign_cursor() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        let other_partition = CursorPayload::new(
            "dev-order",
            Direction::Ascending,
            KeyValue::from("C2"),
            Some(KeyValue::Number(1)),
        )
        .encode()
        .unwrap();
        let result = repo
            .get_by_partition_key_paginated("C1", Direction::Ascending, Some(&other_partition), 10)
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidCursor(_))));

        let no_sort = CursorPayload::new("dev-order", Direction::Ascending, KeyValue::from("C1"), None)
            .encode()
            .unwrap();
        let result = repo
            .get_by_partition_key_paginated("C1", Direction::Ascending, Some(&no_sort), 10)
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidCursor(_))));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sort_key_range_on_unsorted_collection_is_empty() {
        let store = Arc::new(RecordingStore::default());
        let repo: Repository<Order> = Repository::new(
            store.clone(),
            "dev-calculated",
            KeySchema::partition("customerUuid", |o: &Order| {
                KeyValue::non_empty(&o.customer_uuid)
            }),
        )
        .unwrap();

        let orders = repo.get_by_sort_key_range("C1", 1, 10).await.unwrap();
        assert!(orders.is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sort_key_range_condition() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        repo.get_by_sort_key_range("C1", 100, 200).await.unwrap();

        match &store.calls()[0] {
            Call::Query(request) => assert_eq!(
                request.condition.sort,
                Some((
                    "timestamp".to_string(),
                    SortCondition::Between {
                        low: KeyValue::Number(100),
                        high: KeyValue::Number(200),
                    }
                ))
            ),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_on_index_with_nested_path() {
        let store = Arc::new(RecordingStore::default());
        let repo = repository(store.clone());

        repo.search_nested(
            "pending",
            "lopez",
            "customer.normalizedName",
            Direction::Descending,
            Some(IndexKey::new("statusIndex", "status")),
        )
        .await
        .unwrap();

        match &store.calls()[0] {
            Call::Query(request) => {
                assert_eq!(request.index.as_deref(), Some("statusIndex"));
                assert_eq!(request.condition.partition, KeyPart::new("status", "pending"));
                assert_eq!(
                    request.filter,
                    Some(Filter::Contains {
                        path: AttributePath::parse("customer.normalizedName").unwrap(),
                        substring: "lopez".to_string(),
                    })
                );
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_secondary_index_lookup_takes_first() {
        let store = Arc::new(RecordingStore::with_pages(vec![crate::storage::QueryPage {
            items: vec![
                item(json!({"customerUuid": "C1", "timestamp": 1, "shortId": "ABC"})),
                item(json!({"customerUuid": "C2", "timestamp": 2, "shortId": "ABC"})),
            ],
            last_evaluated_key: None,
        }]));
        let repo = repository(store.clone());

        let found = repo.get_by_short_id("ABC").await.unwrap().unwrap();
        assert_eq!(found.customer_uuid, "C1");

        match &store.calls()[0] {
            Call::Query(request) => {
                assert_eq!(request.index.as_deref(), Some("shortId"));
                assert_eq!(request.limit, Some(1));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }
}
