//! Collection layout descriptions (pure data).

use super::types::{Item, Key, KeyPart, KeyValue};

/// Sort key of a collection: either absent or named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Unsorted,
    Sorted(String),
}

impl SortKey {
    pub fn name(&self) -> Option<&str> {
        match self {
            SortKey::Unsorted => None,
            SortKey::Sorted(name) => Some(name),
        }
    }
}

/// Key attribute names of a collection, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    pub partition_key: String,
    pub sort_key: SortKey,
}

impl KeyLayout {
    pub fn new(partition_key: impl Into<String>, sort_key: SortKey) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key,
        }
    }

    /// Returns true if `attribute` names one of the key attributes.
    pub fn is_key_attribute(&self, attribute: &str) -> bool {
        self.partition_key == attribute || self.sort_key.name() == Some(attribute)
    }

    /// Extracts the primary key of a stored item.
    ///
    /// Returns `None` when a key attribute is missing or not a scalar.
    pub fn key_of(&self, item: &Item) -> Option<Key> {
        let partition = KeyValue::from_json(item.get(&self.partition_key)?)?;
        let sort = match &self.sort_key {
            SortKey::Unsorted => None,
            SortKey::Sorted(name) => Some(KeyPart::new(
                name.clone(),
                KeyValue::from_json(item.get(name)?)?,
            )),
        };
        Some(Key {
            partition: KeyPart::new(self.partition_key.clone(), partition),
            sort,
        })
    }
}

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::String,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::Number,
        }
    }
}

/// Secondary index definition. All attributes are projected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

impl IndexDefinition {
    /// An index named after its single key attribute, e.g. `uuid`.
    pub fn on_attribute(name: &str) -> Self {
        Self {
            name: name.to_string(),
            partition_key: KeyAttribute::string(name),
            sort_key: None,
        }
    }
}

/// Full description of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, partition_key: KeyAttribute) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key: None,
            indexes: Vec::new(),
        }
    }

    pub fn with_sort_key(mut self, sort_key: KeyAttribute) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Key attribute names of the table.
    pub fn layout(&self) -> KeyLayout {
        KeyLayout {
            partition_key: self.partition_key.name.clone(),
            sort_key: match &self.sort_key {
                Some(attribute) => SortKey::Sorted(attribute.name.clone()),
                None => SortKey::Unsorted,
            },
        }
    }

    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_table() -> TableDefinition {
        TableDefinition::new("dev-order", KeyAttribute::string("customerUuid"))
            .with_sort_key(KeyAttribute::number("timestamp"))
            .with_index(IndexDefinition::on_attribute("shortId"))
    }

    #[test]
    fn test_layout_from_definition() {
        let layout = order_table().layout();
        assert_eq!(layout.partition_key, "customerUuid");
        assert_eq!(layout.sort_key, SortKey::Sorted("timestamp".to_string()));
        assert!(layout.is_key_attribute("timestamp"));
        assert!(layout.is_key_attribute("customerUuid"));
        assert!(!layout.is_key_attribute("shortId"));
    }

    #[test]
    fn test_key_of_item() {
        let layout = order_table().layout();
        let item = json!({ "customerUuid": "C1", "timestamp": 100, "shortId": "ABC" });
        let key = layout.key_of(item.as_object().unwrap()).unwrap();
        assert_eq!(key.partition.value, KeyValue::from("C1"));
        assert_eq!(key.sort.unwrap().value, KeyValue::Number(100));

        let missing_sort = json!({ "customerUuid": "C1" });
        assert!(layout.key_of(missing_sort.as_object().unwrap()).is_none());
    }

    #[test]
    fn test_index_lookup() {
        let table = order_table();
        assert!(table.index("shortId").is_some());
        assert!(table.index("statusIndex").is_none());
    }
}
