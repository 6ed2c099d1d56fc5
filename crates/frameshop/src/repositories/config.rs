use std::sync::Arc;

use frameshop_core::shop::ConfigEntry;
use frameshop_core::storage::{KeySchema, KeyValue, KeyedStore, Repository, RepositoryError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Per-store settings, keyed by store and setting id.
pub struct ConfigRepository {
    repo: Repository<ConfigEntry>,
}

impl ConfigRepository {
    pub fn new(store: Arc<dyn KeyedStore>, table: impl Into<String>) -> Result<Self> {
        let schema = KeySchema::partition("storeId", |c: &ConfigEntry| {
            KeyValue::non_empty(&c.store_id)
        })
        .sorted_by("id", |c: &ConfigEntry| KeyValue::non_empty(&c.id));
        Ok(Self {
            repo: Repository::new(store, table, schema)?,
        })
    }

    /// Reads a setting and decodes its value.
    pub async fn get_config_value<T: DeserializeOwned>(
        &self,
        store_id: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let Some(entry) = self.repo.get(store_id, Some(id.into())).await? else {
            return Ok(None);
        };
        let value = serde_json::from_value(entry.value).map_err(|e| {
            RepositoryError::Serialization(format!("config value {store_id}/{id}: {e}"))
        })?;
        Ok(Some(value))
    }

    pub async fn store_config_value(
        &self,
        store_id: &str,
        id: &str,
        value: &impl Serialize,
    ) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| {
            RepositoryError::Serialization(format!("config value {store_id}/{id}: {e}"))
        })?;
        let entry = ConfigEntry {
            store_id: store_id.to_string(),
            id: id.to_string(),
            value,
        };
        Ok(self.repo.put(&entry).await?)
    }
}

#[cfg(test)]
mod tests {
    use frameshop_core::shop::tables::CONFIG;
    use serde::Deserialize;

    use super::*;
    use crate::error::ShopError;
    use crate::repositories::testing;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Taxes {
        vat: f64,
        included: bool,
    }

    fn repository() -> ConfigRepository {
        ConfigRepository::new(testing::store(), testing::table(CONFIG)).unwrap()
    }

    #[tokio::test]
    async fn test_typed_values() {
        let repo = repository();
        let taxes = Taxes {
            vat: 21.0,
            included: true,
        };
        repo.store_config_value("S1", "taxes", &taxes).await.unwrap();
        repo.store_config_value("S1", "greeting", &"Hola").await.unwrap();

        assert_eq!(
            repo.get_config_value::<Taxes>("S1", "taxes").await.unwrap(),
            Some(taxes)
        );
        assert_eq!(
            repo.get_config_value::<String>("S1", "greeting")
                .await
                .unwrap()
                .as_deref(),
            Some("Hola")
        );
        assert!(repo
            .get_config_value::<Taxes>("S2", "taxes")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_value_of_the_wrong_shape() {
        let repo = repository();
        repo.store_config_value("S1", "taxes", &"not a table")
            .await
            .unwrap();
        assert!(matches!(
            repo.get_config_value::<Taxes>("S1", "taxes").await,
            Err(ShopError::Repository(RepositoryError::Serialization(_)))
        ));
    }
}
