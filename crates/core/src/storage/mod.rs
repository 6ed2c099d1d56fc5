//! Storage abstractions: the [`KeyedStore`] boundary and the generic
//! [`Repository`] engine built on top of it.

mod chunk;
mod cursor;
mod engine;
mod error;
mod schema;
mod traits;
mod types;

pub use chunk::chunk;
pub use cursor::Cursor;
pub use engine::{IndexKey, KeyExtractor, KeyField, KeySchema, Repository, DEFAULT_PAGE_SIZE};
pub use error::{RepositoryError, Result, StoreError};
pub use schema::{
    AttributeType, IndexDefinition, KeyAttribute, KeyLayout, SortKey, TableDefinition,
};
pub use traits::{KeyedStore, StoreResult, MAX_BATCH_GET_ITEMS, MAX_BATCH_WRITE_ITEMS};
pub use types::{
    AttributePath, Direction, Filter, Item, Key, KeyCondition, KeyPart, KeyValue, KeyValues,
    Page, QueryPage, QueryRequest, SortCondition, TransactWrite, WriteRequest,
};
