//! Collections of the shop and their key layouts.

use crate::storage::{IndexDefinition, KeyAttribute, TableDefinition};

pub const CUSTOMER: &str = "customer";
pub const ORDER: &str = "order";
pub const LIST_PRICING: &str = "list-pricing";
pub const CALCULATED_ITEM_ORDER: &str = "calculated-item-order";
pub const FILE: &str = "file";
pub const CONFIG: &str = "config";
pub const ORDER_AUDIT_TRAIL: &str = "order-audit-trail";

/// Every collection, in provisioning order.
pub const COLLECTIONS: [&str; 7] = [
    CUSTOMER,
    ORDER,
    LIST_PRICING,
    CALCULATED_ITEM_ORDER,
    FILE,
    CONFIG,
    ORDER_AUDIT_TRAIL,
];

/// Index of orders by status, newest first within a status.
pub const ORDER_STATUS_INDEX: &str = "statusIndex";

/// Physical table name of a collection in an environment, e.g. `dev-order`.
pub fn table_name(env: &str, collection: &str) -> String {
    format!("{env}-{collection}")
}

/// Definition of one collection under the given physical table name.
///
/// Returns `None` for an unknown collection.
pub fn table_definition(collection: &str, name: impl Into<String>) -> Option<TableDefinition> {
    let name = name.into();
    let definition = match collection {
        CUSTOMER => TableDefinition::new(name, KeyAttribute::string("storeId"))
            .with_sort_key(KeyAttribute::string("phone"))
            .with_index(IndexDefinition::on_attribute("uuid")),
        ORDER => TableDefinition::new(name, KeyAttribute::string("customerUuid"))
            .with_sort_key(KeyAttribute::number("timestamp"))
            .with_index(IndexDefinition::on_attribute("uuid"))
            .with_index(IndexDefinition::on_attribute("shortId"))
            .with_index(IndexDefinition {
                name: ORDER_STATUS_INDEX.to_string(),
                partition_key: KeyAttribute::string("status"),
                sort_key: Some(KeyAttribute::number("timestamp")),
            }),
        LIST_PRICING => TableDefinition::new(name, KeyAttribute::string("type"))
            .with_sort_key(KeyAttribute::string("id"))
            .with_index(IndexDefinition::on_attribute("uuid")),
        CALCULATED_ITEM_ORDER => TableDefinition::new(name, KeyAttribute::string("orderUuid")),
        FILE => TableDefinition::new(name, KeyAttribute::string("orderUuid"))
            .with_sort_key(KeyAttribute::string("fileUuid")),
        CONFIG => TableDefinition::new(name, KeyAttribute::string("storeId"))
            .with_sort_key(KeyAttribute::string("id")),
        ORDER_AUDIT_TRAIL => TableDefinition::new(name, KeyAttribute::string("orderUuid"))
            .with_sort_key(KeyAttribute::number("timestamp")),
        _ => return None,
    };
    Some(definition)
}

/// Definitions of every collection of an environment, named `<env>-<collection>`.
pub fn table_definitions(env: &str) -> Vec<TableDefinition> {
    COLLECTIONS
        .iter()
        .filter_map(|collection| table_definition(collection, table_name(env, collection)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AttributeType, SortKey};

    #[test]
    fn test_every_collection_is_defined() {
        let definitions = table_definitions("dev");
        assert_eq!(definitions.len(), COLLECTIONS.len());
        assert_eq!(definitions[0].name, "dev-customer");
        assert_eq!(definitions[6].name, "dev-order-audit-trail");
    }

    #[test]
    fn test_order_layout() {
        let order = table_definition(ORDER, "prod-order").unwrap();
        assert_eq!(
            order.layout().sort_key,
            SortKey::Sorted("timestamp".to_string())
        );
        assert_eq!(
            order.sort_key.as_ref().map(|k| k.attribute_type),
            Some(AttributeType::Number)
        );

        let status = order.index(ORDER_STATUS_INDEX).unwrap();
        assert_eq!(status.partition_key.name, "status");
        assert_eq!(status.sort_key.as_ref().unwrap().name, "timestamp");
        assert!(order.index("shortId").is_some());
    }

    #[test]
    fn test_calculated_items_are_unsorted() {
        let table = table_definition(CALCULATED_ITEM_ORDER, "dev-calculated-item-order").unwrap();
        assert_eq!(table.layout().sort_key, SortKey::Unsorted);
        assert!(table.indexes.is_empty());
    }

    #[test]
    fn test_unknown_collection() {
        assert!(table_definition("invoice", "dev-invoice").is_none());
    }
}
