//! DynamoDB store implementation.
//!
//! Implements `KeyedStore` from `frameshop_core::storage` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    Delete, DeleteRequest, KeysAndAttributes, Put, PutRequest, TransactWriteItem,
    WriteRequest as DynamoWriteRequest,
};
use aws_sdk_dynamodb::Client;
use serde_json::Value;

use frameshop_core::storage::{
    AttributePath, Item, Key, KeyedStore, QueryPage, QueryRequest, StoreError, StoreResult,
    TransactWrite, WriteRequest, MAX_BATCH_GET_ITEMS, MAX_BATCH_WRITE_ITEMS,
};

use super::conversions::{
    attributes_to_item, item_to_attributes, key_to_attributes, to_attribute_value,
};
use super::error::{
    map_batch_get_item_error, map_batch_write_item_error, map_build_error, map_get_item_error,
    map_put_item_error, map_query_error, map_transact_write_items_error, map_update_item_error,
};
use super::expressions::ExpressionBuilder;

/// DynamoDB-based store.
///
/// Point reads and table queries are strongly consistent. Index queries are
/// eventually consistent, as DynamoDB requires for global indexes.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a store over an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store for the given region, optionally against a custom
    /// endpoint such as DynamoDB Local.
    pub async fn connect(region: &str, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));

        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }

    fn to_dynamo_write(request: WriteRequest) -> StoreResult<DynamoWriteRequest> {
        let builder = DynamoWriteRequest::builder();
        let builder = match request {
            WriteRequest::Put(item) => builder.put_request(
                PutRequest::builder()
                    .set_item(Some(item_to_attributes(&item)))
                    .build()
                    .map_err(map_build_error)?,
            ),
            WriteRequest::Delete(key) => builder.delete_request(
                DeleteRequest::builder()
                    .set_key(Some(key_to_attributes(&key)))
                    .build()
                    .map_err(map_build_error)?,
            ),
        };
        Ok(builder.build())
    }

    fn to_transact_item(operation: TransactWrite) -> StoreResult<TransactWriteItem> {
        let builder = TransactWriteItem::builder();
        let builder = match operation {
            TransactWrite::Put { table, item } => builder.put(
                Put::builder()
                    .table_name(table)
                    .set_item(Some(item_to_attributes(&item)))
                    .build()
                    .map_err(map_build_error)?,
            ),
            TransactWrite::Delete { table, key } => builder.delete(
                Delete::builder()
                    .table_name(table)
                    .set_key(Some(key_to_attributes(&key)))
                    .build()
                    .map_err(map_build_error)?,
            ),
        };
        Ok(builder.build())
    }
}

#[async_trait]
impl KeyedStore for DynamoDbStore {
    async fn get_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key_to_attributes(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.as_ref().map(attributes_to_item).transpose()
    }

    async fn batch_get_items(&self, table: &str, keys: &[Key]) -> StoreResult<Vec<Item>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        if keys.len() > MAX_BATCH_GET_ITEMS {
            return Err(StoreError::InvalidRequest(format!(
                "BatchGetItem accepts at most {MAX_BATCH_GET_ITEMS} keys, got {}",
                keys.len()
            )));
        }

        let request = KeysAndAttributes::builder()
            .set_keys(Some(keys.iter().map(key_to_attributes).collect()))
            .consistent_read(true)
            .build()
            .map_err(map_build_error)?;

        let result = self
            .client
            .batch_get_item()
            .request_items(table, request)
            .send()
            .await
            .map_err(map_batch_get_item_error)?;

        if result
            .unprocessed_keys
            .as_ref()
            .is_some_and(|unprocessed| !unprocessed.is_empty())
        {
            return Err(StoreError::Throttled(format!(
                "BatchGetItem left unprocessed keys for {table}"
            )));
        }

        result
            .responses
            .and_then(|mut responses| responses.remove(table))
            .unwrap_or_default()
            .iter()
            .map(attributes_to_item)
            .collect()
    }

    async fn query(&self, request: &QueryRequest) -> StoreResult<QueryPage> {
        let mut expressions = ExpressionBuilder::default();
        let key_condition = expressions.key_condition(&request.condition);
        let filter = request.filter.as_ref().map(|f| expressions.filter(f));
        let (names, values) = expressions.into_parts();

        let limit = request
            .limit
            .map(|limit| i32::try_from(limit).unwrap_or(i32::MAX));
        let exclusive_start_key = request.exclusive_start_key.as_ref().map(item_to_attributes);

        let result = self
            .client
            .query()
            .table_name(&request.table)
            .set_index_name(request.index.clone())
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .scan_index_forward(request.direction.is_ascending())
            .consistent_read(request.index.is_none())
            .set_limit(limit)
            .set_exclusive_start_key(exclusive_start_key)
            .send()
            .await
            .map_err(map_query_error)?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(attributes_to_item)
            .collect::<StoreResult<Vec<_>>>()?;
        let last_evaluated_key = result
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .as_ref()
            .map(attributes_to_item)
            .transpose()?;

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item_to_attributes(&item)))
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        path: &AttributePath,
        value: Value,
    ) -> StoreResult<()> {
        let mut expressions = ExpressionBuilder::default();
        let condition = expressions.exists(&key.partition.name);
        let update = expressions.set(path, to_attribute_value(&value));
        let (names, values) = expressions.into_parts();

        self.client
            .update_item()
            .table_name(table)
            .set_key(Some(key_to_attributes(key)))
            .condition_expression(condition)
            .update_expression(update)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await
            .map_err(map_update_item_error)?;

        Ok(())
    }

    async fn batch_write_items(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> StoreResult<()> {
        if requests.is_empty() {
            return Ok(());
        }
        if requests.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(StoreError::InvalidRequest(format!(
                "BatchWriteItem accepts at most {MAX_BATCH_WRITE_ITEMS} requests, got {}",
                requests.len()
            )));
        }

        let writes = requests
            .into_iter()
            .map(Self::to_dynamo_write)
            .collect::<StoreResult<Vec<_>>>()?;

        let result = self
            .client
            .batch_write_item()
            .request_items(table, writes)
            .send()
            .await
            .map_err(map_batch_write_item_error)?;

        let unprocessed = result
            .unprocessed_items
            .as_ref()
            .and_then(|items| items.get(table))
            .map_or(0, Vec::len);
        if unprocessed > 0 {
            return Err(StoreError::Throttled(format!(
                "BatchWriteItem left {unprocessed} unprocessed requests for {table}"
            )));
        }

        Ok(())
    }

    async fn transact_write(&self, operations: [TransactWrite; 2]) -> StoreResult<()> {
        let items = operations
            .into_iter()
            .map(Self::to_transact_item)
            .collect::<StoreResult<Vec<_>>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_transact_write_items_error)?;

        Ok(())
    }
}
