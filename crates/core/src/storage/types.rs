use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RepositoryError;

/// A stored record: attribute name to attribute value.
pub type Item = serde_json::Map<String, Value>;

/// A scalar key attribute value.
///
/// Strings order lexicographically and numbers numerically. A single key
/// attribute never mixes both kinds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Number(i64),
    String(String),
}

impl KeyValue {
    /// Builds a string key value, returning `None` for an empty string.
    pub fn non_empty(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(Self::String(value.to_string()))
        }
    }

    /// Reads a key value from a JSON attribute.
    ///
    /// Only strings and integral numbers are valid key values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Number),
            _ => None,
        }
    }

    /// Converts the key value into a JSON attribute.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => Value::from(*n),
        }
    }

    /// Returns true for an empty string value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for KeyValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

/// One named key attribute with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    pub name: String,
    pub value: KeyValue,
}

impl KeyPart {
    pub fn new(name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The primary key of a stored item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub partition: KeyPart,
    pub sort: Option<KeyPart>,
}

impl Key {
    /// Renders the key as an item holding only the key attributes.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(self.partition.name.clone(), self.partition.value.to_json());
        if let Some(sort) = &self.sort {
            item.insert(sort.name.clone(), sort.value.to_json());
        }
        item
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.partition.name, self.partition.value)?;
        if let Some(sort) = &self.sort {
            write!(f, ", {}={}", sort.name, sort.value)?;
        }
        Ok(())
    }
}

/// Partition and optional sort value addressing one item of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValues {
    pub partition: KeyValue,
    pub sort: Option<KeyValue>,
}

impl KeyValues {
    pub fn new(partition: impl Into<KeyValue>, sort: Option<KeyValue>) -> Self {
        Self {
            partition: partition.into(),
            sort,
        }
    }
}

/// Read direction over the sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn is_ascending(self) -> bool {
        matches!(self, Direction::Ascending)
    }
}

/// A dotted attribute path such as `dimensions.totalWidth`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    /// Parses a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self, RepositoryError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(RepositoryError::InvalidPath(path.to_string()));
        }
        Ok(Self(segments))
    }

    /// A path naming one top-level attribute.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_top_level(&self) -> bool {
        self.0.len() == 1
    }

    /// Resolves the path against an item.
    pub fn resolve<'a>(&self, item: &'a Item) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let mut current = item.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Condition on the sort key of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCondition {
    /// Inclusive on both ends.
    Between { low: KeyValue, high: KeyValue },
}

/// Key condition of a query: partition equality plus an optional sort condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCondition {
    pub partition: KeyPart,
    pub sort: Option<(String, SortCondition)>,
}

/// Store-side filter applied to the items a query evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// String attribute containing a substring, or list attribute containing
    /// the string as an element.
    Contains {
        path: AttributePath,
        substring: String,
    },
}

impl Filter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Filter::Contains { path, substring } => match path.resolve(item) {
                Some(Value::String(s)) => s.contains(substring.as_str()),
                Some(Value::Array(values)) => values
                    .iter()
                    .any(|v| v.as_str() == Some(substring.as_str())),
                _ => false,
            },
        }
    }
}

/// A single query round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub condition: KeyCondition,
    pub filter: Option<Filter>,
    pub direction: Direction,
    /// Maximum number of items evaluated (before filtering).
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<Item>,
}

impl QueryRequest {
    pub fn new(table: impl Into<String>, condition: KeyCondition) -> Self {
        Self {
            table: table.into(),
            index: None,
            condition,
            filter: None,
            direction: Direction::Ascending,
            limit: None,
            exclusive_start_key: None,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Present when more items may follow.
    pub last_evaluated_key: Option<Item>,
}

/// One entry of a batched write request.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(Key),
}

/// One operation of a transactional write.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactWrite {
    Put { table: String, item: Item },
    Delete { table: String, key: Key },
}

/// A page of typed results and the cursor to resume after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub elements: Vec<T>,
    pub next_cursor: Option<super::Cursor>,
}
