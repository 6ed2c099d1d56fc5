use std::sync::Arc;

use frameshop_core::shop::{normalize_text, Customer};
use frameshop_core::storage::{
    Cursor, Direction, KeySchema, KeyValue, KeyValues, KeyedStore, Page, Repository,
    DEFAULT_PAGE_SIZE,
};

use crate::error::{Result, ShopError};

/// Customers, keyed by store and phone number.
pub struct CustomerRepository {
    repo: Repository<Customer>,
}

impl CustomerRepository {
    pub fn new(store: Arc<dyn KeyedStore>, table: impl Into<String>) -> Result<Self> {
        let schema = KeySchema::partition("storeId", |c: &Customer| KeyValue::non_empty(&c.store_id))
            .sorted_by("phone", |c: &Customer| KeyValue::non_empty(&c.phone));
        Ok(Self {
            repo: Repository::new(store, table, schema)?,
        })
    }

    pub async fn get_customer_by_id(&self, uuid: &str) -> Result<Option<Customer>> {
        Ok(self.repo.get_by_uuid(uuid).await?)
    }

    pub async fn get_customer_by_phone(
        &self,
        store_id: &str,
        phone: &str,
    ) -> Result<Option<Customer>> {
        Ok(self.repo.get(store_id, Some(phone.into())).await?)
    }

    /// Every customer of a store, ordered by phone.
    pub async fn get_all_customers(&self, store_id: &str) -> Result<Vec<Customer>> {
        Ok(self
            .repo
            .get_by_partition_key(store_id, Direction::Ascending)
            .await?)
    }

    pub async fn get_all_customers_paginated(
        &self,
        store_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Customer>> {
        Ok(self
            .repo
            .get_by_partition_key_paginated(
                store_id,
                Direction::Ascending,
                cursor,
                DEFAULT_PAGE_SIZE,
            )
            .await?)
    }

    pub async fn create_customer(&self, customer: &Customer) -> Result<()> {
        validate(customer)?;
        self.repo.put(customer).await?;
        tracing::info!(customer_uuid = %customer.uuid, store_id = %customer.store_id, "Customer created");
        Ok(())
    }

    /// Renames a customer and refreshes its search field.
    ///
    /// The whole record is written back with one `put`.
    pub async fn update_name(&self, store_id: &str, phone: &str, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ShopError::invalid("customer", "name is empty"));
        }
        let mut customer = self
            .get_customer_by_phone(store_id, phone)
            .await?
            .ok_or_else(|| ShopError::NotFound {
                entity: "customer",
                id: format!("{store_id}/{phone}"),
            })?;

        customer.rename(name);
        self.repo.put(&customer).await?;
        Ok(())
    }

    /// Stores `new` in place of `old`. Handles phone number changes.
    pub async fn update_full_customer(&self, old: &Customer, new: &Customer) -> Result<()> {
        validate(new)?;
        self.repo.replace_key(old, new).await?;
        Ok(())
    }

    /// Customers of a store whose normalized name contains `query`.
    pub async fn search_customers(&self, store_id: &str, query: &str) -> Result<Vec<Customer>> {
        Ok(self
            .repo
            .search(
                store_id,
                &normalize_text(query),
                "normalizedName",
                Direction::Ascending,
                None,
            )
            .await?)
    }

    pub async fn store_customers(&self, customers: &[Customer]) -> Result<()> {
        Ok(self.repo.batch_put(customers).await?)
    }

    pub async fn delete_customer(&self, customer: &Customer) -> Result<()> {
        let key = KeyValues::new(customer.store_id.as_str(), Some(customer.phone.as_str().into()));
        self.repo.batch_delete(&[key]).await?;
        tracing::info!(customer_uuid = %customer.uuid, "Customer deleted");
        Ok(())
    }
}

fn validate(customer: &Customer) -> Result<()> {
    let missing = [
        ("uuid", &customer.uuid),
        ("name", &customer.name),
        ("phone", &customer.phone),
        ("storeId", &customer.store_id),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());

    match missing {
        Some((field, _)) => Err(ShopError::invalid("customer", format!("{field} is empty"))),
        None => Ok(()),
    }
}
