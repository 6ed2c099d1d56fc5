//! Data layer of a picture framing shop.
//!
//! Domain repositories for customers, orders, price lists and their
//! satellites, built on the generic engine of `frameshop_core::storage`
//! and backed by DynamoDB or an in-memory store.

pub mod config;
pub mod error;
pub mod repositories;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{Result, ShopError};
pub use state::Shop;
