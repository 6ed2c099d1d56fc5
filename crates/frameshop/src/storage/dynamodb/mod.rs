//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the
//! `KeyedStore` trait using `aws-sdk-dynamodb`. Items are stored as native
//! attribute maps, one table per collection.

mod conversions;
mod error;
mod expressions;
mod store;

pub use store::DynamoDbStore;
