//! Table deployment operations (Imperative Shell).

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, CreateGlobalSecondaryIndexAction, GlobalSecondaryIndex,
    GlobalSecondaryIndexUpdate, KeySchemaElement, KeyType, Projection, ProjectionType,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use frameshop_core::storage::{AttributeType, IndexDefinition, KeyAttribute, TableDefinition};

use super::client;
use super::error::{DynamodbError, Result};
use super::planning::{DeployPlan, DestroyPlan, IndexStatus, TableStatus};

/// Execute a deploy plan.
pub async fn execute_deploy_plan(client: &Client, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { definition } => {
            create_table(client, definition).await?;
            wait_for_table_active(client, &definition.name).await?;
        }
        DeployPlan::AddIndexes {
            table_name,
            indexes,
        } => {
            // DynamoDB accepts one index creation per update.
            for index in indexes {
                add_index(client, table_name, index).await?;
                wait_for_table_active(client, table_name).await?;
            }
        }
        DeployPlan::NoChanges { .. } => {}
    }
    Ok(())
}

/// Execute a destroy plan.
pub async fn execute_destroy_plan(client: &Client, plan: &DestroyPlan) -> Result<()> {
    if let DestroyPlan::DeleteTable { table_name } = plan {
        client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    }
    Ok(())
}

async fn create_table(client: &Client, definition: &TableDefinition) -> Result<()> {
    let mut attribute_definitions = Vec::new();
    for key in key_attributes(definition) {
        if !attribute_definitions
            .iter()
            .any(|a: &AttributeDefinition| a.attribute_name() == key.name)
        {
            attribute_definitions.push(attribute_definition(key)?);
        }
    }

    let mut request = client
        .create_table()
        .table_name(&definition.name)
        .set_key_schema(Some(key_schema(
            &definition.partition_key,
            definition.sort_key.as_ref(),
        )?))
        .set_attribute_definitions(Some(attribute_definitions))
        .billing_mode(BillingMode::PayPerRequest);

    for index in &definition.indexes {
        request = request.global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(&index.name)
                .set_key_schema(Some(key_schema(
                    &index.partition_key,
                    index.sort_key.as_ref(),
                )?))
                .projection(all_attributes())
                .build()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
        );
    }

    request
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    Ok(())
}

async fn add_index(client: &Client, table_name: &str, index: &IndexDefinition) -> Result<()> {
    let mut attribute_definitions = vec![attribute_definition(&index.partition_key)?];
    if let Some(sort) = &index.sort_key {
        attribute_definitions.push(attribute_definition(sort)?);
    }

    client
        .update_table()
        .table_name(table_name)
        .set_attribute_definitions(Some(attribute_definitions))
        .global_secondary_index_updates(
            GlobalSecondaryIndexUpdate::builder()
                .create(
                    CreateGlobalSecondaryIndexAction::builder()
                        .index_name(&index.name)
                        .set_key_schema(Some(key_schema(
                            &index.partition_key,
                            index.sort_key.as_ref(),
                        )?))
                        .projection(all_attributes())
                        .build()
                        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
                )
                .build(),
        )
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    Ok(())
}

/// Table and index key attributes, table keys first.
fn key_attributes(definition: &TableDefinition) -> Vec<&KeyAttribute> {
    let mut keys = vec![&definition.partition_key];
    keys.extend(definition.sort_key.as_ref());
    for index in &definition.indexes {
        keys.push(&index.partition_key);
        keys.extend(index.sort_key.as_ref());
    }
    keys
}

fn key_schema(
    partition: &KeyAttribute,
    sort: Option<&KeyAttribute>,
) -> Result<Vec<KeySchemaElement>> {
    let mut schema = vec![KeySchemaElement::builder()
        .attribute_name(&partition.name)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?];

    if let Some(sort) = sort {
        schema.push(
            KeySchemaElement::builder()
                .attribute_name(&sort.name)
                .key_type(KeyType::Range)
                .build()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
        );
    }
    Ok(schema)
}

fn attribute_definition(key: &KeyAttribute) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(to_scalar_type(key.attribute_type))
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

fn all_attributes() -> Projection {
    Projection::builder()
        .projection_type(ProjectionType::All)
        .build()
}

async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    let max_attempts = 60;
    let delay = Duration::from_secs(2);

    for _ in 0..max_attempts {
        if let Some(state) = client::get_table_state(client, table_name).await? {
            let indexes_active = state.indexes.iter().all(|i| i.status == IndexStatus::Active);
            if state.status == TableStatus::Active && indexes_active {
                return Ok(());
            }
        }
        tokio::time::sleep(delay).await;
    }

    Err(DynamodbError::TableActivationTimeout {
        table_name: table_name.to_string(),
    })
}

fn to_scalar_type(attribute_type: AttributeType) -> ScalarAttributeType {
    match attribute_type {
        AttributeType::String => ScalarAttributeType::S,
        AttributeType::Number => ScalarAttributeType::N,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frameshop_core::shop::tables::{table_definition, ORDER};

    #[test]
    fn test_key_attributes_include_index_keys() {
        let order = table_definition(ORDER, "dev-order").unwrap();
        let keys = key_attributes(&order);
        let names: Vec<&str> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["customerUuid", "timestamp", "uuid", "shortId", "status", "timestamp"]
        );
    }

    #[test]
    fn test_number_keys_map_to_n() {
        assert_eq!(to_scalar_type(AttributeType::Number), ScalarAttributeType::N);
        assert_eq!(to_scalar_type(AttributeType::String), ScalarAttributeType::S);
    }
}
