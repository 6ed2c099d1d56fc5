use std::sync::Arc;

use frameshop_core::shop::OrderAuditTrailEntry;
use frameshop_core::storage::{Direction, KeySchema, KeyValue, KeyedStore, Repository};

use crate::error::Result;

/// Change history of orders, keyed by order and timestamp.
pub struct OrderAuditTrailRepository {
    repo: Repository<OrderAuditTrailEntry>,
}

impl OrderAuditTrailRepository {
    pub fn new(store: Arc<dyn KeyedStore>, table: impl Into<String>) -> Result<Self> {
        let schema = KeySchema::partition("orderUuid", |e: &OrderAuditTrailEntry| {
            KeyValue::non_empty(&e.order_uuid)
        })
        .sorted_by("timestamp", |e: &OrderAuditTrailEntry| {
            Some(KeyValue::Number(e.timestamp))
        });
        Ok(Self {
            repo: Repository::new(store, table, schema)?,
        })
    }

    pub async fn create_entry(&self, entry: &OrderAuditTrailEntry) -> Result<()> {
        Ok(self.repo.put(entry).await?)
    }

    /// Entries of an order, most recent first.
    pub async fn get_entries(&self, order_uuid: &str) -> Result<Vec<OrderAuditTrailEntry>> {
        Ok(self
            .repo
            .get_by_partition_key(order_uuid, Direction::Descending)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use frameshop_core::shop::tables::ORDER_AUDIT_TRAIL;
    use serde_json::json;

    use super::*;
    use crate::repositories::testing;

    #[tokio::test]
    async fn test_entries_are_most_recent_first() {
        let repo = OrderAuditTrailRepository::new(
            testing::store(),
            testing::table(ORDER_AUDIT_TRAIL),
        )
        .unwrap();

        for (timestamp, kind) in [(100, "created"), (300, "status"), (200, "amountPayed")] {
            let mut entry = OrderAuditTrailEntry::new("O1", "U1", kind)
                .with_change(Some(json!("pending")), Some(json!("finished")));
            entry.timestamp = timestamp;
            repo.create_entry(&entry).await.unwrap();
        }

        let entries = repo.get_entries("O1").await.unwrap();
        let kinds = entries.iter().map(|e| e.kind.as_str()).collect::<Vec<_>>();
        assert_eq!(kinds, vec!["status", "amountPayed", "created"]);
        assert_eq!(entries[0].new_value, Some(json!("finished")));
        assert!(repo.get_entries("O2").await.unwrap().is_empty());
    }
}
