//! Domain repositories.
//!
//! Each repository wraps a [`Repository`](frameshop_core::storage::Repository)
//! configured with the key schema of its collection and exposes the
//! operations the shop needs.

mod audit_trail;
mod calculated_item;
mod config;
mod customer;
mod file;
mod list_pricing;
mod order;

pub use audit_trail::OrderAuditTrailRepository;
pub use calculated_item::CalculatedItemRepository;
pub use config::ConfigRepository;
pub use customer::CustomerRepository;
pub use file::FileRepository;
pub use list_pricing::ListPricingRepository;
pub use order::OrderRepository;
