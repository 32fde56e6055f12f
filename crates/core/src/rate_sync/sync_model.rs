//! Sync request, settings and summary models.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    MATRIX_ZONE_BATCH_SIZE, PROBE_CONCURRENCY, PROBE_TIMEOUT_SECS, SYNC_BATCH_DELAY_MS,
};
use crate::errors::{Error, ValidationError};
use crate::zones::{all_zone_codes, italian_zone_codes, ZONE_CALABRIA, ZONE_ITALIA};

/// Sampling density of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Two zones, three weights.
    Fast,
    /// Every Italian zone at the common weight breaks.
    #[default]
    #[serde(alias = "italy-only")]
    Balanced,
    /// Every zone at every kilogram up to 100.
    Matrix,
}

const FAST_WEIGHTS: [u32; 3] = [2, 10, 30];
const BALANCED_WEIGHTS: [u32; 9] = [2, 5, 10, 20, 30, 50, 70, 100, 105];
const MATRIX_MAX_WEIGHT: u32 = 100;
const MATRIX_OVERSIZE_WEIGHT: u32 = 105;

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Fast => "fast",
            SyncMode::Balanced => "balanced",
            SyncMode::Matrix => "matrix",
        }
    }

    /// Zones the mode covers, in catalog order.
    pub fn zones(&self) -> Vec<&'static str> {
        match self {
            SyncMode::Fast => vec![ZONE_ITALIA, ZONE_CALABRIA],
            SyncMode::Balanced => italian_zone_codes(),
            SyncMode::Matrix => all_zone_codes(),
        }
    }

    /// Probe weights in kilograms, ascending.
    pub fn weights(&self) -> Vec<Decimal> {
        match self {
            SyncMode::Fast => FAST_WEIGHTS.iter().map(|w| Decimal::from(*w)).collect(),
            SyncMode::Balanced => BALANCED_WEIGHTS.iter().map(|w| Decimal::from(*w)).collect(),
            SyncMode::Matrix => (1..=MATRIX_MAX_WEIGHT)
                .chain(std::iter::once(MATRIX_OVERSIZE_WEIGHT))
                .map(Decimal::from)
                .collect(),
        }
    }

    /// Upstream calls of a run that syncs every zone of the mode.
    pub fn estimate_calls(&self) -> usize {
        self.zones().len() * self.weights().len()
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(SyncMode::Fast),
            "balanced" | "italy-only" => Ok(SyncMode::Balanced),
            "matrix" => Ok(SyncMode::Matrix),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown sync mode '{}'",
                other
            )))),
        }
    }
}

/// Request to fill the missing zones of a price list from the carrier rate API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub price_list_id: String,
    /// Zones to probe regardless of existing entries.
    #[serde(default)]
    pub target_zones: Option<Vec<String>>,
    #[serde(default)]
    pub mode: SyncMode,
    /// Courier configuration overriding the one stored on the list.
    #[serde(default)]
    pub config_id: Option<String>,
}

impl SyncRequest {
    pub fn new(price_list_id: impl Into<String>, mode: SyncMode) -> Self {
        Self {
            price_list_id: price_list_id.into(),
            mode,
            ..Default::default()
        }
    }

    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_zones = Some(zones.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSyncResult {
    pub zone: String,
    pub zone_name: String,
    pub success: bool,
    pub entries_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ZoneSyncResult {
    pub fn succeeded(zone: &str, zone_name: String, entries_added: usize) -> Self {
        Self {
            zone: zone.to_string(),
            zone_name,
            success: true,
            entries_added,
            error: None,
        }
    }

    pub fn failed(zone: &str, zone_name: String, error: impl Into<String>) -> Self {
        Self {
            zone: zone.to_string(),
            zone_name,
            success: false,
            entries_added: 0,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a sync run. `success` holds when no zone failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub success: bool,
    pub zones_processed: usize,
    pub zones_succeeded: usize,
    pub zones_failed: usize,
    pub total_entries_added: usize,
    pub results: Vec<ZoneSyncResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SyncSummary {
    pub fn from_results(results: Vec<ZoneSyncResult>) -> Self {
        let zones_succeeded = results.iter().filter(|r| r.success).count();
        let zones_failed = results.len() - zones_succeeded;
        Self {
            success: zones_failed == 0,
            zones_processed: results.len(),
            zones_succeeded,
            zones_failed,
            total_entries_added: results.iter().map(|r| r.entries_added).sum(),
            results,
            note: None,
        }
    }

    pub fn nothing_to_sync(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::from_results(Vec::new())
        }
    }
}

/// Pacing of a sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Zones probed concurrently; `None` picks the mode's default.
    pub zone_batch_size: Option<usize>,
    /// Pause between zone batches.
    pub batch_delay: Duration,
    pub probe_concurrency: usize,
    /// A probe running longer counts as a probe without a matching rate.
    pub probe_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            zone_batch_size: None,
            batch_delay: Duration::from_millis(SYNC_BATCH_DELAY_MS),
            probe_concurrency: PROBE_CONCURRENCY,
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
        }
    }
}

impl SyncSettings {
    pub fn zone_batch_size(&self, mode: SyncMode) -> usize {
        let default = match mode {
            SyncMode::Matrix => MATRIX_ZONE_BATCH_SIZE,
            SyncMode::Fast | SyncMode::Balanced => 1,
        };
        self.zone_batch_size.unwrap_or(default).max(1)
    }
}
