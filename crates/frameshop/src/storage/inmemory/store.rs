//! In-memory key-value store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use frameshop_core::storage::{
    AttributePath, AttributeType, Item, Key, KeyAttribute, KeyLayout, KeyValue, KeyedStore,
    QueryPage, QueryRequest, SortCondition, StoreError, StoreResult, TableDefinition,
    TransactWrite, WriteRequest, MAX_BATCH_GET_ITEMS, MAX_BATCH_WRITE_ITEMS,
};

/// Primary key of a stored item: partition value and optional sort value.
type StoredKey = (KeyValue, Option<KeyValue>);

/// Ordering position of an item within a query scope.
type Position = (Option<KeyValue>, StoredKey);

/// In-memory storage backend.
///
/// Tables are created from [`TableDefinition`]s and kept in `BTreeMap`s
/// behind `Arc<RwLock<_>>`. Batches and transactions are applied under a
/// single write lock. Data is lost when the store is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

#[derive(Debug)]
struct Table {
    definition: TableDefinition,
    layout: KeyLayout,
    items: BTreeMap<StoredKey, Item>,
}

/// Key attributes a query runs over: the table keys or those of an index.
struct Scope<'a> {
    partition: &'a KeyAttribute,
    sort: Option<&'a KeyAttribute>,
}

impl InMemoryStore {
    /// Creates an empty store with one table per definition.
    pub fn new(definitions: impl IntoIterator<Item = TableDefinition>) -> Self {
        let tables = definitions
            .into_iter()
            .map(|definition| {
                let layout = definition.layout();
                (
                    definition.name.clone(),
                    Table {
                        definition,
                        layout,
                        items: BTreeMap::new(),
                    },
                )
            })
            .collect();
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Number of items stored in a table, or `None` for an unknown table.
    pub async fn item_count(&self, table: &str) -> Option<usize> {
        let tables = self.tables.read().await;
        tables.get(table).map(|t| t.items.len())
    }
}

impl Table {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn stored_key(&self, key: &Key) -> StoreResult<StoredKey> {
        let partition_key = &self.definition.partition_key;
        if key.partition.name != partition_key.name
            || !has_type(&key.partition.value, partition_key.attribute_type)
        {
            return Err(self.key_mismatch(key));
        }

        let sort = match (&self.definition.sort_key, &key.sort) {
            (None, None) => None,
            (Some(attribute), Some(part))
                if attribute.name == part.name && has_type(&part.value, attribute.attribute_type) =>
            {
                Some(part.value.clone())
            }
            _ => return Err(self.key_mismatch(key)),
        };
        Ok((key.partition.value.clone(), sort))
    }

    fn item_key(&self, item: &Item) -> StoreResult<StoredKey> {
        let partition = required_value(self.name(), item, &self.definition.partition_key)?;
        let sort = self
            .definition
            .sort_key
            .as_ref()
            .map(|attribute| required_value(self.name(), item, attribute))
            .transpose()?;
        Ok((partition, sort))
    }

    fn key_mismatch(&self, key: &Key) -> StoreError {
        StoreError::InvalidRequest(format!(
            "key {key} does not match the schema of table {}",
            self.name()
        ))
    }

    fn scope(&self, index: Option<&str>) -> StoreResult<Scope<'_>> {
        match index {
            None => Ok(Scope {
                partition: &self.definition.partition_key,
                sort: self.definition.sort_key.as_ref(),
            }),
            Some(name) => {
                let index = self.definition.index(name).ok_or_else(|| {
                    StoreError::InvalidRequest(format!(
                        "table {} has no index named {name}",
                        self.name()
                    ))
                })?;
                Ok(Scope {
                    partition: &index.partition_key,
                    sort: index.sort_key.as_ref(),
                })
            }
        }
    }

    fn position(&self, item: &Item, scope: &Scope<'_>) -> StoreResult<Position> {
        let sort = scope
            .sort
            .map(|attribute| required_value(self.name(), item, attribute))
            .transpose()?;
        Ok((sort, self.item_key(item)?))
    }

    /// Key attributes of the table and of the scope, copied from `item`.
    fn continuation_key(&self, item: &Item, scope: &Scope<'_>) -> Item {
        let mut names = vec![&self.definition.partition_key, scope.partition];
        names.extend(self.definition.sort_key.as_ref());
        names.extend(scope.sort);

        names
            .into_iter()
            .filter_map(|attribute| {
                item.get(&attribute.name)
                    .map(|value| (attribute.name.clone(), value.clone()))
            })
            .collect()
    }

    fn query(&self, request: &QueryRequest) -> StoreResult<QueryPage> {
        let scope = self.scope(request.index.as_deref())?;
        if request.condition.partition.name != scope.partition.name {
            return Err(StoreError::InvalidRequest(format!(
                "query on {} must use partition key {}",
                self.name(),
                scope.partition.name
            )));
        }

        let range = match &request.condition.sort {
            None => None,
            Some((name, SortCondition::Between { low, high })) => {
                if scope.sort.map(|attribute| attribute.name.as_str()) != Some(name.as_str()) {
                    return Err(StoreError::InvalidRequest(format!(
                        "query on {} has no sort key named {name}",
                        self.name()
                    )));
                }
                Some((low, high))
            }
        };

        let limit = match request.limit {
            Some(0) => {
                return Err(StoreError::InvalidRequest(
                    "limit must be at least 1".to_string(),
                ))
            }
            Some(limit) => limit,
            None => usize::MAX,
        };

        let partition = &request.condition.partition.value;
        let mut matches: Vec<(Position, &Item)> = self
            .items
            .iter()
            .filter_map(|(key, item)| {
                if &scoped_value(item, scope.partition)? != partition {
                    return None;
                }
                let sort = match scope.sort {
                    Some(attribute) => Some(scoped_value(item, attribute)?),
                    None => None,
                };
                if let (Some((low, high)), Some(value)) = (range, &sort) {
                    if value < low || value > high {
                        return None;
                    }
                }
                Some(((sort, key.clone()), item))
            })
            .collect();

        matches.sort_by(|a, b| a.0.cmp(&b.0));
        let ascending = request.direction.is_ascending();
        if !ascending {
            matches.reverse();
        }

        if let Some(start) = &request.exclusive_start_key {
            let start = self.position(start, &scope)?;
            matches.retain(|(position, _)| {
                if ascending {
                    position > &start
                } else {
                    position < &start
                }
            });
        }

        let more = matches.len() > limit;
        matches.truncate(limit);

        let last_evaluated_key = if more {
            matches
                .last()
                .map(|(_, item)| self.continuation_key(item, &scope))
        } else {
            None
        };

        let items = matches
            .into_iter()
            .map(|(_, item)| item)
            .filter(|item| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(item))
            })
            .cloned()
            .collect();

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    fn ensure_not_key(&self, path: &AttributePath) -> StoreResult<()> {
        if self.layout.is_key_attribute(&path.segments()[0]) {
            return Err(StoreError::InvalidRequest(format!(
                "cannot update key attribute {path} of table {}",
                self.name()
            )));
        }
        Ok(())
    }

    fn update(&mut self, key: &Key, path: &AttributePath, value: Value) -> StoreResult<()> {
        let stored = self.stored_key(key)?;
        self.ensure_not_key(path)?;

        match self.items.get_mut(&stored) {
            Some(item) => set_path(item, path, value),
            None => Err(StoreError::NotFound(format!(
                "no item at {key} in table {}",
                self.name()
            ))),
        }
    }
}

fn has_type(value: &KeyValue, attribute_type: AttributeType) -> bool {
    match (value, attribute_type) {
        (KeyValue::String(s), AttributeType::String) => !s.is_empty(),
        (KeyValue::Number(_), AttributeType::Number) => true,
        _ => false,
    }
}

/// Value of a key attribute, if present with the declared type.
fn scoped_value(item: &Item, attribute: &KeyAttribute) -> Option<KeyValue> {
    item.get(&attribute.name)
        .and_then(KeyValue::from_json)
        .filter(|value| has_type(value, attribute.attribute_type))
}

fn required_value(table: &str, item: &Item, attribute: &KeyAttribute) -> StoreResult<KeyValue> {
    scoped_value(item, attribute).ok_or_else(|| {
        StoreError::InvalidRequest(format!(
            "item for table {table} is missing key attribute {} or has the wrong type",
            attribute.name
        ))
    })
}

fn set_path(item: &mut Item, path: &AttributePath, value: Value) -> StoreResult<()> {
    let invalid = || StoreError::InvalidRequest(format!("document path {path} is invalid"));

    let Some((last, parents)) = path.segments().split_last() else {
        return Err(invalid());
    };
    let mut current = item;
    for segment in parents {
        current = current
            .get_mut(segment)
            .and_then(Value::as_object_mut)
            .ok_or_else(invalid)?;
    }
    current.insert(last.clone(), value);
    Ok(())
}

fn unknown_table(table: &str) -> StoreError {
    StoreError::InvalidRequest(format!("table {table} not found"))
}

#[async_trait]
impl KeyedStore for InMemoryStore {
    async fn get_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>> {
        let tables = self.tables.read().await;
        let table = tables.get(table).ok_or_else(|| unknown_table(table))?;
        let key = table.stored_key(key)?;
        Ok(table.items.get(&key).cloned())
    }

    async fn batch_get_items(&self, table: &str, keys: &[Key]) -> StoreResult<Vec<Item>> {
        if keys.len() > MAX_BATCH_GET_ITEMS {
            return Err(StoreError::InvalidRequest(format!(
                "batch get of {} keys exceeds {MAX_BATCH_GET_ITEMS}",
                keys.len()
            )));
        }

        let tables = self.tables.read().await;
        let table = tables.get(table).ok_or_else(|| unknown_table(table))?;
        let keys = keys
            .iter()
            .map(|key| table.stored_key(key))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(keys
            .iter()
            .filter_map(|key| table.items.get(key).cloned())
            .collect())
    }

    async fn query(&self, request: &QueryRequest) -> StoreResult<QueryPage> {
        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table)
            .ok_or_else(|| unknown_table(&request.table))?;
        table.query(request)
    }

    async fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        let key = table.item_key(&item)?;
        table.items.insert(key, item);
        Ok(())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        path: &AttributePath,
        value: Value,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        table.update(key, path, value)
    }

    async fn batch_write_items(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> StoreResult<()> {
        if requests.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(StoreError::InvalidRequest(format!(
                "batch write of {} requests exceeds {MAX_BATCH_WRITE_ITEMS}",
                requests.len()
            )));
        }

        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;

        let mut writes = Vec::with_capacity(requests.len());
        for request in requests {
            let key = match &request {
                WriteRequest::Put(item) => table.item_key(item)?,
                WriteRequest::Delete(key) => table.stored_key(key)?,
            };
            if writes.iter().any(|(existing, _)| existing == &key) {
                return Err(StoreError::InvalidRequest(
                    "batch contains duplicate keys".to_string(),
                ));
            }
            writes.push((key, request));
        }

        for (key, request) in writes {
            match request {
                WriteRequest::Put(item) => {
                    table.items.insert(key, item);
                }
                WriteRequest::Delete(_) => {
                    table.items.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn transact_write(&self, operations: [TransactWrite; 2]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        let mut targets = Vec::with_capacity(operations.len());
        for operation in &operations {
            let (name, key) = match operation {
                TransactWrite::Put { table, item } => {
                    let target = tables.get(table).ok_or_else(|| unknown_table(table))?;
                    (table.as_str(), target.item_key(item)?)
                }
                TransactWrite::Delete { table, key } => {
                    let target = tables.get(table).ok_or_else(|| unknown_table(table))?;
                    (table.as_str(), target.stored_key(key)?)
                }
            };
            if targets.contains(&(name, key.clone())) {
                return Err(StoreError::InvalidRequest(
                    "transaction targets the same item twice".to_string(),
                ));
            }
            targets.push((name, key));
        }
        let keys: Vec<StoredKey> = targets.into_iter().map(|(_, key)| key).collect();

        for (operation, key) in operations.into_iter().zip(keys) {
            match operation {
                TransactWrite::Put { table, item } => {
                    if let Some(target) = tables.get_mut(&table) {
                        target.items.insert(key, item);
                    }
                }
                TransactWrite::Delete { table, .. } => {
                    if let Some(target) = tables.get_mut(&table) {
                        target.items.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}
