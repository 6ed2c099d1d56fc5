use std::sync::Arc;

use frameshop_core::shop::CalculatedItem;
use frameshop_core::storage::{KeySchema, KeyValue, KeyedStore, Repository};

use crate::error::Result;

/// Price breakdowns, one per order.
pub struct CalculatedItemRepository {
    repo: Repository<CalculatedItem>,
}

impl CalculatedItemRepository {
    pub fn new(store: Arc<dyn KeyedStore>, table: impl Into<String>) -> Result<Self> {
        let schema = KeySchema::partition("orderUuid", |i: &CalculatedItem| {
            KeyValue::non_empty(&i.order_uuid)
        });
        Ok(Self {
            repo: Repository::new(store, table, schema)?,
        })
    }

    pub async fn get_calculated_item(&self, order_uuid: &str) -> Result<Option<CalculatedItem>> {
        Ok(self.repo.get(order_uuid, None).await?)
    }

    pub async fn create_calculated_item(&self, item: &CalculatedItem) -> Result<()> {
        Ok(self.repo.put(item).await?)
    }

    /// Breakdowns of several orders. Orders without one are skipped.
    pub async fn get_calculated_items(&self, order_uuids: &[&str]) -> Result<Vec<CalculatedItem>> {
        let keys = order_uuids
            .iter()
            .map(|uuid| KeyValue::from(*uuid))
            .collect::<Vec<_>>();
        Ok(self.repo.get_by_partition_keys(&keys).await?)
    }
}
