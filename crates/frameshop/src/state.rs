//! Shared repository bundle.

use std::sync::Arc;

use frameshop_core::storage::KeyedStore;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::{
    CalculatedItemRepository, ConfigRepository, CustomerRepository, FileRepository,
    ListPricingRepository, OrderAuditTrailRepository, OrderRepository,
};

/// Every domain repository over one store.
///
/// Cloning is cheap; the repositories are shared.
#[derive(Clone)]
pub struct Shop {
    pub customers: Arc<CustomerRepository>,
    pub orders: Arc<OrderRepository>,
    pub list_pricing: Arc<ListPricingRepository>,
    pub calculated_items: Arc<CalculatedItemRepository>,
    pub files: Arc<FileRepository>,
    pub config: Arc<ConfigRepository>,
    pub audit_trail: Arc<OrderAuditTrailRepository>,
}

impl Shop {
    /// Builds the repositories on the tables named by `config`.
    pub fn new(store: Arc<dyn KeyedStore>, config: &Config) -> Result<Self> {
        let tables = &config.tables;
        Ok(Self {
            customers: Arc::new(CustomerRepository::new(store.clone(), &tables.customer)?),
            orders: Arc::new(OrderRepository::new(store.clone(), &tables.order)?),
            list_pricing: Arc::new(ListPricingRepository::new(
                store.clone(),
                &tables.list_pricing,
            )?),
            calculated_items: Arc::new(CalculatedItemRepository::new(
                store.clone(),
                &tables.calculated_item_order,
            )?),
            files: Arc::new(FileRepository::new(store.clone(), &tables.file)?),
            config: Arc::new(ConfigRepository::new(store.clone(), &tables.config)?),
            audit_trail: Arc::new(OrderAuditTrailRepository::new(
                store,
                &tables.order_audit_trail,
            )?),
        })
    }

    /// A shop backed by an empty in-memory store with every table created.
    #[cfg(feature = "inmemory")]
    pub fn in_memory(config: &Config) -> Result<Self> {
        let store = crate::storage::InMemoryStore::new(config.table_definitions());
        Self::new(Arc::new(store), config)
    }
}
