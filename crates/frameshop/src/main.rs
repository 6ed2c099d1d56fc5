use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frameshop::storage::DynamoDbStore;
use frameshop::{Config, Shop};
use frameshop_core::shop::{OrderStatus, PricingType};
use frameshop_core::storage::Cursor;

/// Frameshop - Query the order data of a picture framing shop
#[derive(Parser, Debug)]
#[command(name = "frameshop")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Environment used as table name prefix
    #[arg(long, global = true, env = "FRAMESHOP_ENV")]
    env: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom DynamoDB endpoint, e.g. http://localhost:8000
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Customer lookups
    Customers {
        #[command(subcommand)]
        command: CustomersCommand,
    },
    /// Order lookups
    Orders {
        #[command(subcommand)]
        command: OrdersCommand,
    },
    /// List the prices of a pricing type
    Prices {
        /// Pricing type: mold, glass, back, pp, fabric, labour or other
        #[arg(long = "type", value_parser = parse_pricing_type)]
        pricing_type: PricingType,
    },
    /// Show the change history of an order
    Audit {
        /// Order uuid
        order_uuid: String,
    },
}

#[derive(Subcommand, Debug)]
enum CustomersCommand {
    /// One page of the customers of a store
    List {
        #[arg(long, env = "FRAMESHOP_STORE_ID")]
        store: String,
        /// Cursor returned by the previous page
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Customers whose name contains the query
    Search {
        #[arg(long, env = "FRAMESHOP_STORE_ID")]
        store: String,
        query: String,
    },
    /// Customer by phone number
    Show {
        #[arg(long, env = "FRAMESHOP_STORE_ID")]
        store: String,
        phone: String,
    },
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
    /// Order by uuid or short id
    Show { id: String },
    /// Orders of a store in a status, newest first
    Status {
        #[arg(long, env = "FRAMESHOP_STORE_ID")]
        store: String,
        /// pending, finished, deleted or picked_up
        #[arg(value_parser = parse_status)]
        status: OrderStatus,
        /// Only orders whose customer name contains this text
        #[arg(long)]
        query: Option<String>,
    },
    /// One page of the orders of a customer, newest first
    Customer {
        customer_uuid: String,
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frameshop=info,frameshop_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli);
    tracing::debug!(env = %config.env, region = %config.aws_region, "Configuration loaded");

    let store = DynamoDbStore::connect(&config.aws_region, config.aws_endpoint_url.as_deref()).await;
    let shop = Shop::new(Arc::new(store), &config)?;

    match cli.command {
        Command::Customers { command } => run_customers(&shop, command).await,
        Command::Orders { command } => run_orders(&shop, command).await,
        Command::Prices { pricing_type } => {
            print_json(&shop.list_pricing.get_all_prices_by_type(pricing_type).await?)
        }
        Command::Audit { order_uuid } => {
            print_json(&shop.audit_trail.get_entries(&order_uuid).await?)
        }
    }
}

/// Environment configuration with command line overrides applied.
fn load_config(cli: &Cli) -> Config {
    let region = cli.region.clone();
    let endpoint_url = cli.endpoint_url.clone();
    let env = cli.env.clone();

    Config::from_lookup(move |key| match key {
        "FRAMESHOP_ENV" if env.is_some() => env.clone(),
        "AWS_REGION" if region.is_some() => region.clone(),
        "AWS_ENDPOINT_URL" if endpoint_url.is_some() => endpoint_url.clone(),
        _ => std::env::var(key).ok(),
    })
}

async fn run_customers(shop: &Shop, command: CustomersCommand) -> Result<()> {
    match command {
        CustomersCommand::List { store, cursor } => {
            let cursor = cursor.map(Cursor::from_token);
            let page = shop
                .customers
                .get_all_customers_paginated(&store, cursor.as_ref())
                .await?;
            print_json(&page)
        }
        CustomersCommand::Search { store, query } => {
            print_json(&shop.customers.search_customers(&store, &query).await?)
        }
        CustomersCommand::Show { store, phone } => {
            let customer = shop
                .customers
                .get_customer_by_phone(&store, &phone)
                .await?
                .with_context(|| format!("No customer with phone {phone} in store {store}"))?;
            print_json(&customer)
        }
    }
}

async fn run_orders(shop: &Shop, command: OrdersCommand) -> Result<()> {
    match command {
        OrdersCommand::Show { id } => {
            let order = match shop.orders.get_order_by_id(&id).await? {
                Some(order) => Some(order),
                None => shop.orders.get_order_by_short_id(&id).await?,
            };
            print_json(&order.with_context(|| format!("No order with id {id}"))?)
        }
        OrdersCommand::Status {
            store,
            status,
            query,
        } => {
            let orders = match query {
                Some(query) => {
                    shop.orders
                        .find_orders_by_status(status, &query, &store)
                        .await?
                }
                None => shop.orders.get_orders_by_status(status, &store).await?,
            };
            print_json(&orders)
        }
        OrdersCommand::Customer {
            customer_uuid,
            cursor,
        } => {
            let cursor = cursor.map(Cursor::from_token);
            let page = shop
                .orders
                .get_orders_by_customer_paginated(&customer_uuid, cursor.as_ref())
                .await?;
            print_json(&page)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_status(value: &str) -> std::result::Result<OrderStatus, String> {
    OrderStatus::parse(value).ok_or_else(|| format!("unknown order status '{value}'"))
}

fn parse_pricing_type(value: &str) -> std::result::Result<PricingType, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown pricing type '{value}'"))
}
