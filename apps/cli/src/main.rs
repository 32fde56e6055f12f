//! parcelrate - incremental carrier-rate sync for one price list.
//!
//! Reads its configuration from the environment, probes the carrier rate API
//! for the zones the list is missing and prints the sync summary as JSON.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use parcelrate_carrier_rates::{HttpRateProvider, RateLimiter, RateProvider};
use parcelrate_core::rate_sync::{
    CarrierRatesClient, MatrixSyncService, MatrixSyncServiceTrait, SyncMode, SyncRequest,
};
use parcelrate_core::ActionResult;
use parcelrate_storage_sqlite::{
    create_pool, prepare_database_file, run_migrations, spawn_writer, PriceListRepository,
};

use config::Config;

/// Synchronize a price list with live carrier rates
#[derive(Parser, Debug)]
#[command(name = "parcelrate")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Price list to fill in
    price_list_id: String,

    /// Zone and weight coverage: fast, balanced (alias italy-only) or matrix
    #[arg(long, default_value = "balanced")]
    mode: SyncMode,

    /// Comma-separated zone codes; overrides the mode's zones
    #[arg(long, value_delimiter = ',')]
    zones: Option<Vec<String>>,

    /// Courier configuration to probe with instead of the list's own
    #[arg(long)]
    config_id: Option<String>,

    /// Only print the zones that would be probed
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing() {
    let log_format =
        std::env::var("PARCELRATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `init` also routes `log` records from the library crates into the subscriber.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing();

    prepare_database_file(&config.db_path)?;
    let pool = create_pool(&config.db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());
    tracing::info!("Database path in use: {}", config.db_path);

    let price_lists = Arc::new(PriceListRepository::new(pool.clone(), writer));

    let Some(base_url) = config.rates_base_url.clone() else {
        bail!("PARCELRATE_RATES_BASE_URL is required to probe carrier rates");
    };
    let provider: Arc<dyn RateProvider> = Arc::new(
        HttpRateProvider::new(
            base_url,
            config.rates_api_key.clone(),
            config.sync.probe_timeout + Duration::from_secs(1),
        )
        .with_rate_limit(config.rate_limit.clone()),
    );
    let probe_client = Arc::new(CarrierRatesClient::new(provider, Arc::new(RateLimiter::new())));

    let sync_service =
        MatrixSyncService::with_settings(price_lists, probe_client, config.sync.clone());

    let actor = config.actor();
    let mut request = SyncRequest::new(cli.price_list_id, cli.mode);
    if let Some(zones) = cli.zones {
        request = request.with_zones(zones);
    }
    request.config_id = cli.config_id;

    let output = if cli.dry_run {
        let planned = sync_service.plan_zones(&actor, &request);
        if let Ok(zones) = &planned {
            tracing::info!(
                "{} zones planned, about {} probes",
                zones.len(),
                zones.len() * request.mode.weights().len()
            );
        }
        serde_json::to_string_pretty(&ActionResult::from_result(planned, Some(&actor)))?
    } else {
        let summary = sync_service.sync_price_list(&actor, request).await;
        serde_json::to_string_pretty(&ActionResult::from_result(summary, Some(&actor)))?
    };
    println!("{}", output);
    Ok(())
}
