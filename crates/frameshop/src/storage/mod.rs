//! Storage backend implementations.
//!
//! This module provides concrete implementations of the
//! [`KeyedStore`](frameshop_core::storage::KeyedStore) trait. Backends are
//! selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory`: in-memory store, used by tests and local development
//! - `dynamodb`: AWS DynamoDB store using `aws-sdk-dynamodb`
//!
//! Both are enabled by default and can coexist.

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p frameshop --features inmemory"
);

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
