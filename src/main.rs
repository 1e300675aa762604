//! ITscope Client CLI
//!
//! Looks up products, accessories and product types in the ITscope catalog
//! and prints them as JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use itscope_client::domain::product::filter_product_types_by_group_id;
use itscope_client::{
    ItscopeClient, Language, Product, ProductAssembler, ProductCatalog, RequestContext, Settings,
};

/// Command line interface
#[derive(Parser, Debug)]
#[command(name = "itscope-client", version, about = "Query the ITscope product catalog")]
struct Cli {
    /// Abort the whole operation after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Response language (overrides configuration)
    #[arg(long, global = true)]
    language: Option<Language>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up one product by distributor SKU
    Product { sku: String },
    /// Image URLs of one product
    Images { sku: String },
    /// All accessories of a product
    Accessories { sku: String },
    /// Service accessories of a product
    ServiceAccessories { sku: String },
    /// The product type catalog
    Types {
        /// Only types in this group (e.g. SSP)
        #[arg(long)]
        group: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("itscope_client=info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load configuration")?;

    let client = Arc::new(ItscopeClient::from_settings(&settings).context("Failed to create ITscope client")?);
    if let Some(language) = cli.language.clone() {
        client.set_language(language);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = client.base_url(),
        "Starting ITscope client"
    );

    // Ctrl-C cancels everything in flight
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling requests");
            signal_token.cancel();
        }
    });

    let mut ctx = RequestContext::from_token(shutdown);
    if let Some(secs) = cli.timeout_secs {
        ctx = ctx.timeout(Duration::from_secs(secs));
    }

    run(cli.command, client, &ctx).await
}

async fn run(command: Command, client: Arc<ItscopeClient>, ctx: &RequestContext) -> Result<()> {
    match command {
        Command::Product { sku } => {
            let product = find_product(&client, ctx, &sku).await?;
            print_json(&product)
        }
        Command::Images { sku } => {
            let product = find_product(&client, ctx, &sku).await?;
            print_json(&product.image_urls())
        }
        Command::Accessories { sku } => {
            let product = find_product(&client, ctx, &sku).await?;
            let accessories = ProductAssembler::new(client).product_accessories(ctx, &product).await?;
            info!(count = accessories.len(), "Fetched accessories");
            print_json(&accessories)
        }
        Command::ServiceAccessories { sku } => {
            let product = find_product(&client, ctx, &sku).await?;
            let services = ProductAssembler::new(client).service_type_accessories(ctx, &product).await?;
            info!(count = services.len(), "Fetched service accessories");
            print_json(&services)
        }
        Command::Types { group } => {
            let types = client.get_all_product_types(ctx).await?;
            match group {
                Some(group) => print_json(&filter_product_types_by_group_id(&group, &types)),
                None => print_json(&types),
            }
        }
    }
}

async fn find_product(client: &ItscopeClient, ctx: &RequestContext, sku: &str) -> Result<Product> {
    client
        .get_product_data(ctx, sku)
        .await?
        .with_context(|| format!("No product found for SKU {}", sku))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
