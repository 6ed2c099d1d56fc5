use std::sync::Arc;

use frameshop_core::shop::{ListPrice, PricingType};
use frameshop_core::storage::{
    Direction, KeySchema, KeyValue, KeyValues, KeyedStore, Repository,
};

use crate::error::{Result, ShopError};

/// Price list entries, keyed by pricing type and id.
pub struct ListPricingRepository {
    repo: Repository<ListPrice>,
}

impl ListPricingRepository {
    pub fn new(store: Arc<dyn KeyedStore>, table: impl Into<String>) -> Result<Self> {
        let schema = KeySchema::partition("type", |p: &ListPrice| {
            Some(KeyValue::from(p.pricing_type.as_str()))
        })
        .sorted_by("id", |p: &ListPrice| KeyValue::non_empty(&p.id));
        Ok(Self {
            repo: Repository::new(store, table, schema)?,
        })
    }

    pub async fn get_by_type_and_id(
        &self,
        pricing_type: PricingType,
        id: &str,
    ) -> Result<Option<ListPrice>> {
        Ok(self
            .repo
            .get(pricing_type.as_str(), Some(id.into()))
            .await?)
    }

    pub async fn get_by_internal_id(&self, uuid: &str) -> Result<Option<ListPrice>> {
        Ok(self.repo.get_by_uuid(uuid).await?)
    }

    /// Every price of a type, ordered by id.
    pub async fn get_all_prices_by_type(&self, pricing_type: PricingType) -> Result<Vec<ListPrice>> {
        Ok(self
            .repo
            .get_by_partition_key(pricing_type.as_str(), Direction::Ascending)
            .await?)
    }

    pub async fn store_list_price(&self, price: &ListPrice) -> Result<()> {
        validate(price)?;
        Ok(self.repo.put(price).await?)
    }

    pub async fn batch_store_list_prices(&self, prices: &[ListPrice]) -> Result<()> {
        prices.iter().try_for_each(validate)?;
        self.repo.batch_put(prices).await?;
        tracing::info!(count = prices.len(), "List prices stored");
        Ok(())
    }

    pub async fn delete_list_prices(&self, pricing_type: PricingType, ids: &[&str]) -> Result<()> {
        let keys = ids
            .iter()
            .map(|id| KeyValues::new(pricing_type.as_str(), Some(KeyValue::from(*id))))
            .collect::<Vec<_>>();
        Ok(self.repo.batch_delete(&keys).await?)
    }

    pub async fn delete_list_price(&self, price: &ListPrice) -> Result<()> {
        self.delete_list_prices(price.pricing_type, &[price.id.as_str()])
            .await
    }
}

fn validate(price: &ListPrice) -> Result<()> {
    if price.id.trim().is_empty() {
        return Err(ShopError::invalid("list price", "id is empty"));
    }
    if !price.price.is_finite() || price.price < 0.0 {
        return Err(ShopError::invalid(
            "list price",
            format!("price {} is not a valid amount", price.price),
        ));
    }
    Ok(())
}
