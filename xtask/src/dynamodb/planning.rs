//! Pure functions for calculating deployment plans (Functional Core).

use frameshop_core::storage::{AttributeType, IndexDefinition, KeyAttribute, TableDefinition};

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    pub indexes: Vec<IndexState>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Global secondary index state.
#[derive(Debug, Clone)]
pub struct IndexState {
    pub name: String,
    pub status: IndexStatus,
}

/// Global secondary index status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { definition: TableDefinition },
    /// Table exists, indexes need to be added.
    AddIndexes {
        table_name: String,
        indexes: Vec<IndexDefinition>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

impl DeployPlan {
    pub fn has_changes(&self) -> bool {
        !matches!(self, DeployPlan::NoChanges { .. })
    }
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

impl DestroyPlan {
    pub fn has_changes(&self) -> bool {
        matches!(self, DestroyPlan::DeleteTable { .. })
    }
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(
    current: Option<&TableState>,
    desired: &TableDefinition,
) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            definition: desired.clone(),
        };
    };

    let indexes: Vec<IndexDefinition> = desired
        .indexes
        .iter()
        .filter(|index| !state.indexes.iter().any(|s| s.name == index.name))
        .cloned()
        .collect();

    if indexes.is_empty() {
        DeployPlan::NoChanges {
            table_name: desired.name.clone(),
        }
    } else {
        DeployPlan::AddIndexes {
            table_name: desired.name.clone(),
            indexes,
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

fn key_line(role: &str, key: &KeyAttribute) -> String {
    let code = match key.attribute_type {
        AttributeType::String => "S",
        AttributeType::Number => "N",
    };
    format!("{role}: {} ({code})", key.name)
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { definition } => {
            let mut lines = vec![
                format!("+ Create table: {}", definition.name),
                format!("  {}", key_line("Partition key", &definition.partition_key)),
            ];
            if let Some(sort) = &definition.sort_key {
                lines.push(format!("  {}", key_line("Sort key", sort)));
            }
            for index in &definition.indexes {
                lines.push(format!("  + Index: {}", index.name));
                lines.push(format!("    {}", key_line("Partition key", &index.partition_key)));
                if let Some(sort) = &index.sort_key {
                    lines.push(format!("    {}", key_line("Sort key", sort)));
                }
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::AddIndexes {
            table_name,
            indexes,
        } => {
            let mut lines = vec![format!("~ Update table: {table_name}")];
            for index in indexes {
                lines.push(format!("  + Add index: {}", index.name));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{table_name}' is up to date")]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!("- Delete table: {table_name} (ALL DATA WILL BE LOST)")]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{table_name}' does not exist")]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frameshop_core::shop::tables::{table_definition, ORDER, ORDER_STATUS_INDEX};

    fn order_table() -> TableDefinition {
        table_definition(ORDER, "dev-order").unwrap()
    }

    fn state(indexes: &[&str]) -> TableState {
        TableState {
            status: TableStatus::Active,
            indexes: indexes
                .iter()
                .map(|name| IndexState {
                    name: name.to_string(),
                    status: IndexStatus::Active,
                })
                .collect(),
        }
    }

    #[test]
    fn test_missing_table_is_created() {
        let plan = calculate_deploy_plan(None, &order_table());
        assert_eq!(
            plan,
            DeployPlan::CreateTable {
                definition: order_table()
            }
        );

        let lines = format_deploy_plan(&plan);
        assert_eq!(lines[0], "+ Create table: dev-order");
        assert!(lines.contains(&"  Sort key: timestamp (N)".to_string()));
        assert!(lines.contains(&format!("  + Index: {ORDER_STATUS_INDEX}")));
    }

    #[test]
    fn test_missing_indexes_are_added() {
        let plan = calculate_deploy_plan(Some(&state(&["uuid"])), &order_table());
        match &plan {
            DeployPlan::AddIndexes { table_name, indexes } => {
                assert_eq!(table_name, "dev-order");
                let names: Vec<&str> = indexes.iter().map(|i| i.name.as_str()).collect();
                assert_eq!(names, vec!["shortId", ORDER_STATUS_INDEX]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(plan.has_changes());
    }

    #[test]
    fn test_complete_table_has_no_changes() {
        let plan = calculate_deploy_plan(
            Some(&state(&["uuid", "shortId", ORDER_STATUS_INDEX])),
            &order_table(),
        );
        assert!(!plan.has_changes());
        assert_eq!(
            format_deploy_plan(&plan),
            vec!["= Table 'dev-order' is up to date".to_string()]
        );
    }

    #[test]
    fn test_destroy_plan() {
        let plan = calculate_destroy_plan(Some(&state(&[])), "dev-order");
        assert!(plan.has_changes());

        let plan = calculate_destroy_plan(None, "dev-order");
        assert_eq!(
            plan,
            DestroyPlan::AlreadyGone {
                table_name: "dev-order".to_string()
            }
        );
        assert!(!plan.has_changes());
    }
}
