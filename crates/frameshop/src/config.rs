use std::env;

use frameshop_core::shop::tables::{self, table_definition, table_name};
use frameshop_core::storage::TableDefinition;

/// Physical table name of every collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub customer: String,
    pub order: String,
    pub list_pricing: String,
    pub calculated_item_order: String,
    pub file: String,
    pub config: String,
    pub order_audit_trail: String,
}

impl TableNames {
    /// Default names for an environment, e.g. `dev-customer`.
    pub fn for_env(env: &str) -> Self {
        Self {
            customer: table_name(env, tables::CUSTOMER),
            order: table_name(env, tables::ORDER),
            list_pricing: table_name(env, tables::LIST_PRICING),
            calculated_item_order: table_name(env, tables::CALCULATED_ITEM_ORDER),
            file: table_name(env, tables::FILE),
            config: table_name(env, tables::CONFIG),
            order_audit_trail: table_name(env, tables::ORDER_AUDIT_TRAIL),
        }
    }

    /// Collection and table name pairs, in provisioning order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (tables::CUSTOMER, self.customer.as_str()),
            (tables::ORDER, self.order.as_str()),
            (tables::LIST_PRICING, self.list_pricing.as_str()),
            (
                tables::CALCULATED_ITEM_ORDER,
                self.calculated_item_order.as_str(),
            ),
            (tables::FILE, self.file.as_str()),
            (tables::CONFIG, self.config.as_str()),
            (tables::ORDER_AUDIT_TRAIL, self.order_audit_trail.as_str()),
        ]
        .into_iter()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Deployment environment used as table name prefix (default: "dev")
    pub env: String,
    pub tables: TableNames,
    /// AWS region (default: "us-east-1")
    pub aws_region: String,
    /// Custom DynamoDB endpoint, e.g. DynamoDB Local
    pub aws_endpoint_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FRAMESHOP_ENV` - Table name prefix (default: "dev")
    /// - `CUSTOMER_TABLE`, `ORDER_TABLE`, `LIST_PRICING_TABLE`,
    ///   `CALCULATED_ITEM_ORDER_TABLE`, `FILE_TABLE`, `CONFIG_TABLE`,
    ///   `ORDER_AUDIT_TRAIL_TABLE` - Per-collection table name overrides
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `AWS_ENDPOINT_URL` - Custom DynamoDB endpoint (optional)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = lookup("FRAMESHOP_ENV")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "dev".to_string());
        let defaults = TableNames::for_env(&env);
        let table = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        Self {
            tables: TableNames {
                customer: table("CUSTOMER_TABLE", defaults.customer),
                order: table("ORDER_TABLE", defaults.order),
                list_pricing: table("LIST_PRICING_TABLE", defaults.list_pricing),
                calculated_item_order: table(
                    "CALCULATED_ITEM_ORDER_TABLE",
                    defaults.calculated_item_order,
                ),
                file: table("FILE_TABLE", defaults.file),
                config: table("CONFIG_TABLE", defaults.config),
                order_audit_trail: table("ORDER_AUDIT_TRAIL_TABLE", defaults.order_audit_trail),
            },
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_endpoint_url: lookup("AWS_ENDPOINT_URL"),
            env,
        }
    }

    /// Definitions of every collection under the configured table names.
    pub fn table_definitions(&self) -> Vec<TableDefinition> {
        self.tables
            .iter()
            .filter_map(|(collection, name)| table_definition(collection, name))
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup(&[]));

        assert_eq!(config.env, "dev");
        assert_eq!(config.tables, TableNames::for_env("dev"));
        assert_eq!(config.tables.order_audit_trail, "dev-order-audit-trail");
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.aws_endpoint_url, None);
    }

    #[test]
    fn test_env_prefix_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("FRAMESHOP_ENV", "prod"),
            ("ORDER_TABLE", "legacy-orders"),
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
        ]));

        assert_eq!(config.tables.customer, "prod-customer");
        assert_eq!(config.tables.order, "legacy-orders");
        assert_eq!(
            config.aws_endpoint_url.as_deref(),
            Some("http://localhost:8000")
        );
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = Config::from_lookup(lookup(&[("FRAMESHOP_ENV", " "), ("FILE_TABLE", "")]));
        assert_eq!(config.env, "dev");
        assert_eq!(config.tables.file, "dev-file");
    }

    #[test]
    fn test_table_definitions_use_configured_names() {
        let config = Config::from_lookup(lookup(&[("ORDER_TABLE", "legacy-orders")]));
        let definitions = config.table_definitions();

        assert_eq!(definitions.len(), 7);
        assert!(definitions.iter().any(|d| d.name == "legacy-orders"
            && d.index(tables::ORDER_STATUS_INDEX).is_some()));
    }
}
