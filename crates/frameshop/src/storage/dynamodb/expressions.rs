//! Expression building.
//!
//! Every attribute name and value goes through a placeholder (`#n0`, `:v0`)
//! so reserved words such as `status`, `type` or `timestamp` never reach the
//! expression text.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use frameshop_core::storage::{AttributePath, Filter, KeyCondition, SortCondition};

use super::conversions::{key_value_to_attribute, AttributeMap};

/// Placeholder maps collected while building expressions.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    names: HashMap<String, String>,
    values: AttributeMap,
}

impl ExpressionBuilder {
    /// Placeholder for an attribute name. Repeated names share a placeholder.
    pub fn name(&mut self, name: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, n)| n.as_str() == name) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), name.to_string());
        placeholder
    }

    /// Placeholder for a value.
    pub fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    /// Document path with one name placeholder per segment.
    pub fn path(&mut self, path: &AttributePath) -> String {
        path.segments()
            .iter()
            .map(|segment| self.name(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `#pk = :v` plus an optional `AND #sk BETWEEN :lo AND :hi`.
    pub fn key_condition(&mut self, condition: &KeyCondition) -> String {
        let partition = self.name(&condition.partition.name);
        let value = self.value(key_value_to_attribute(&condition.partition.value));
        let mut expression = format!("{partition} = {value}");

        if let Some((name, SortCondition::Between { low, high })) = &condition.sort {
            let sort = self.name(name);
            let low = self.value(key_value_to_attribute(low));
            let high = self.value(key_value_to_attribute(high));
            expression.push_str(&format!(" AND {sort} BETWEEN {low} AND {high}"));
        }
        expression
    }

    pub fn filter(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::Contains { path, substring } => {
                let path = self.path(path);
                let value = self.value(AttributeValue::S(substring.clone()));
                format!("contains({path}, {value})")
            }
        }
    }

    /// `SET <path> = :v`.
    pub fn set(&mut self, path: &AttributePath, value: AttributeValue) -> String {
        let path = self.path(path);
        let value = self.value(value);
        format!("SET {path} = {value}")
    }

    /// `attribute_exists(<name>)`, used to keep updates from creating items.
    pub fn exists(&mut self, name: &str) -> String {
        format!("attribute_exists({})", self.name(name))
    }

    /// Name and value maps, `None` when empty as the SDK expects.
    pub fn into_parts(self) -> (Option<HashMap<String, String>>, Option<AttributeMap>) {
        let names = (!self.names.is_empty()).then_some(self.names);
        let values = (!self.values.is_empty()).then_some(self.values);
        (names, values)
    }
}
