use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use parcelrate_carrier_rates::RateLimitConfig;
use parcelrate_core::rate_sync::SyncSettings;
use parcelrate_core::{Actor, ActorRole};

const DEFAULT_DB_PATH: &str = "./data/parcelrate.db";

/// Runtime configuration read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub rates_base_url: Option<String>,
    pub rates_api_key: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub sync: SyncSettings,
    pub actor_id: String,
    pub actor_role: ActorRole,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = SyncSettings::default();
        let limit_defaults = RateLimitConfig::default();

        let probe_timeout = parse_var("PARCELRATE_PROBE_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.probe_timeout);
        let batch_delay = parse_var("PARCELRATE_SYNC_BATCH_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.batch_delay);

        Ok(Self {
            db_path: var("PARCELRATE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            rates_base_url: var("PARCELRATE_RATES_BASE_URL"),
            rates_api_key: var("PARCELRATE_RATES_API_KEY"),
            rate_limit: RateLimitConfig {
                requests_per_minute: parse_var("PARCELRATE_RATES_PER_MINUTE")?
                    .unwrap_or(limit_defaults.requests_per_minute),
                burst_capacity: parse_var("PARCELRATE_RATES_BURST")?
                    .unwrap_or(limit_defaults.burst_capacity),
            },
            sync: SyncSettings {
                zone_batch_size: parse_var("PARCELRATE_SYNC_BATCH_SIZE")?,
                batch_delay,
                probe_timeout,
                ..defaults
            },
            actor_id: var("PARCELRATE_ACTOR_ID").unwrap_or_else(|| "cli".to_string()),
            actor_role: parse_var("PARCELRATE_ACTOR_ROLE")?.unwrap_or(ActorRole::Admin),
        })
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.actor_id.clone(), self.actor_role)
    }
}

/// A set, non-blank variable.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("invalid value '{}' for {}", raw, name))
        })
        .transpose()
}
