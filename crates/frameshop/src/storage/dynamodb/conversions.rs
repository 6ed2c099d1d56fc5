//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between `AttributeValue` maps and JSON
//! items. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use frameshop_core::storage::{Item, Key, KeyValue, StoreError};
use serde_json::{Number, Value};

/// DynamoDB item representation.
pub type AttributeMap = HashMap<String, AttributeValue>;

// ============================================================================
// JSON -> DynamoDB
// ============================================================================

/// Convert a JSON item to a DynamoDB item. Null attributes are dropped.
pub fn item_to_attributes(item: &Item) -> AttributeMap {
    item.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| (name.clone(), to_attribute_value(value)))
        .collect()
}

/// Convert one JSON value to an `AttributeValue`.
///
/// Nulls inside lists are kept as `NULL` so element positions survive.
pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(item_to_attributes(map)),
    }
}

/// Convert a key value to an `AttributeValue`.
pub fn key_value_to_attribute(value: &KeyValue) -> AttributeValue {
    match value {
        KeyValue::String(s) => AttributeValue::S(s.clone()),
        KeyValue::Number(n) => AttributeValue::N(n.to_string()),
    }
}

/// Convert a primary key to a DynamoDB key map.
pub fn key_to_attributes(key: &Key) -> AttributeMap {
    let mut attributes = HashMap::new();
    attributes.insert(
        key.partition.name.clone(),
        key_value_to_attribute(&key.partition.value),
    );
    if let Some(sort) = &key.sort {
        attributes.insert(sort.name.clone(), key_value_to_attribute(&sort.value));
    }
    attributes
}

// ============================================================================
// DynamoDB -> JSON
// ============================================================================

/// Convert a DynamoDB item to a JSON item.
pub fn attributes_to_item(attributes: &AttributeMap) -> Result<Item, StoreError> {
    attributes
        .iter()
        .map(|(name, value)| Ok((name.clone(), from_attribute_value(name, value)?)))
        .collect()
}

/// Convert one `AttributeValue` to JSON. Binary attributes are not supported.
pub fn from_attribute_value(name: &str, value: &AttributeValue) -> Result<Value, StoreError> {
    match value {
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => parse_number(name, n),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::L(values) => values
            .iter()
            .map(|v| from_attribute_value(name, v))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => attributes_to_item(map).map(Value::Object),
        AttributeValue::Ss(values) => Ok(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(values) => values
            .iter()
            .map(|n| parse_number(name, n))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => Err(StoreError::QueryFailed(format!(
            "Unsupported attribute type for '{name}'"
        ))),
    }
}

fn parse_number(name: &str, raw: &str) -> Result<Value, StoreError> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Value::from(n));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| StoreError::QueryFailed(format!("Invalid number '{raw}' in '{name}'")))
}
