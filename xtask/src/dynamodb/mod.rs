//! DynamoDB infrastructure management commands.

mod client;
mod deploy;
mod error;
mod planning;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use frameshop_core::shop::tables::{self, table_definition, table_name};
use frameshop_core::storage::TableDefinition;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy the shop tables.
    Deploy(DeployCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy the frameshop DynamoDB tables.

By default, this command creates every missing shop table of an environment
(named <env>-<collection>, e.g. dev-order) and adds missing Global Secondary
Indexes to existing ones.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the tables instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Environment used as table name prefix.
    #[arg(long, env = "FRAMESHOP_ENV", default_value = "dev")]
    pub env: String,

    /// Only handle these collections (e.g. order, list-pricing). Repeatable.
    #[arg(long = "collection", value_name = "NAME")]
    pub collections: Vec<String>,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
    }
}

/// Definitions of the selected collections, every collection when none is given.
fn selected_tables(env: &str, collections: &[String]) -> Result<Vec<TableDefinition>> {
    let selected: Vec<&str> = if collections.is_empty() {
        tables::COLLECTIONS.to_vec()
    } else {
        collections.iter().map(String::as_str).collect()
    };

    selected
        .into_iter()
        .map(|collection| {
            table_definition(collection, table_name(env, collection))
                .ok_or_else(|| DynamodbError::UnknownCollection(collection.to_string()))
        })
        .collect()
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let definitions = selected_tables(&cmd.env, &cmd.collections)?;
    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Environment:"), cmd.env);
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;

    let mut states = Vec::with_capacity(definitions.len());
    for definition in &definitions {
        states.push(client::get_table_state(&dynamo_client, &definition.name).await?);
    }

    if cmd.destroy {
        let plans: Vec<_> = definitions
            .iter()
            .zip(&states)
            .map(|(definition, state)| {
                planning::calculate_destroy_plan(state.as_ref(), &definition.name)
            })
            .collect();

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in plans.iter().flat_map(planning::format_destroy_plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if !plans.iter().any(planning::DestroyPlan::has_changes) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Are you sure you want to delete these tables? ALL DATA WILL BE LOST")
                .default(false)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting tables..."));
        }

        for plan in &plans {
            deploy::execute_destroy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Tables destroyed successfully."));
        }
    } else {
        let plans: Vec<_> = definitions
            .iter()
            .zip(&states)
            .map(|(definition, state)| planning::calculate_deploy_plan(state.as_ref(), definition))
            .collect();

        if !global.is_silent() {
            aprintln!("{}", p_c("Deploy Plan:"));
            for line in plans.iter().flat_map(planning::format_deploy_plan) {
                if line.starts_with('+') {
                    aprintln!("  {}", p_g(&line));
                } else if line.starts_with('~') {
                    aprintln!("  {}", p_y(&line));
                } else {
                    aprintln!("  {}", line);
                }
            }
            aprintln!();
        }

        if !plans.iter().any(planning::DeployPlan::has_changes) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Infrastructure is up to date."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Apply these changes?")
                .default(true)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Applying changes..."));
        }

        for plan in &plans {
            deploy::execute_deploy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure deployed successfully."));
        }
    }

    Ok(())
}
