//! In-memory storage backend.
//!
//! A [`KeyedStore`](frameshop_core::storage::KeyedStore) over `BTreeMap`s
//! wrapped in `Arc<RwLock<_>>`. It follows the same contract as the DynamoDB
//! backend (batch ceilings, limit before filter, index ordering) and is used
//! by the tests and for local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use frameshop::storage::inmemory::InMemoryStore;
//! use frameshop_core::shop::tables::table_definitions;
//!
//! let store = InMemoryStore::new(table_definitions("dev"));
//! ```

mod store;

pub use store::InMemoryStore;
