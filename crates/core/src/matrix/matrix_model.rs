//! Price matrix snapshot models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_QUOTE_MARGIN_PERCENT, DEFAULT_VAT_RATE};
use crate::errors::{Error, Result, ValidationError};
use crate::price_lists::{string_enum, VatMode};

/// How goods reach the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// The carrier collects from the client.
    #[default]
    CarrierPickup,
    /// Collected with the seller's own fleet, then handed to the carrier.
    OwnFleet,
    /// The client drops goods at the seller's warehouse.
    ClientDropoff,
}

string_enum!(DeliveryMode {
    CarrierPickup => "carrier_pickup",
    OwnFleet => "own_fleet",
    ClientDropoff => "client_dropoff",
});

/// A matrix row: the half-open bracket `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRange {
    pub from: Decimal,
    pub to: Decimal,
    pub label: String,
}

impl WeightRange {
    pub fn new(from: Decimal, to: Decimal) -> Self {
        Self {
            from,
            to,
            label: format!("{} - {} kg", from.normalize(), to.normalize()),
        }
    }
}

/// Coordinates of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub weight_index: usize,
    pub zone_index: usize,
}

/// Immutable point-in-time price grid, embedded by copy in a quote.
///
/// `prices[weight_index][zone_index]` is the sell price of one cell. With
/// `vat_mode = Excluded` the grid never contains VAT; it is shown separately.
/// Pickup and processing fees are snapshot-level terms, never added per cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceMatrixSnapshot {
    /// Column display names.
    pub zones: Vec<String>,
    /// Column zone codes, parallel to `zones`.
    #[serde(default)]
    pub zone_codes: Vec<String>,
    pub weight_ranges: Vec<WeightRange>,
    pub prices: Vec<Vec<Decimal>>,
    #[serde(default)]
    pub services_included: Vec<String>,
    pub carrier_display_name: String,
    pub vat_mode: VatMode,
    pub vat_rate: Decimal,
    pub margin_percent: Decimal,
    #[serde(default)]
    pub margin_fixed_eur: Option<Decimal>,
    pub volumetric_divisor: Decimal,
    #[serde(default)]
    pub delivery_mode: DeliveryMode,
    #[serde(default)]
    pub pickup_fee: Option<Decimal>,
    #[serde(default)]
    pub goods_needs_processing: bool,
    #[serde(default)]
    pub processing_fee: Option<Decimal>,
    /// Cells whose computed price was negative and got clamped to zero.
    #[serde(default)]
    pub clamped_cells: Vec<MatrixCell>,
    /// Cells with no source entry, filled with zero.
    #[serde(default)]
    pub missing_cells: Vec<MatrixCell>,
    pub generated_at: DateTime<Utc>,
}

impl PriceMatrixSnapshot {
    pub fn is_empty(&self) -> bool {
        self.weight_ranges.is_empty() || self.zones.is_empty()
    }

    pub fn cell(&self, weight_index: usize, zone_index: usize) -> Option<Decimal> {
        self.prices.get(weight_index)?.get(zone_index).copied()
    }

    /// Row count matches the weight ranges, every row matches the zones, no negative price.
    pub fn validate_shape(&self) -> std::result::Result<(), String> {
        if self.prices.len() != self.weight_ranges.len() {
            return Err(format!(
                "{} price rows for {} weight ranges",
                self.prices.len(),
                self.weight_ranges.len()
            ));
        }
        if !self.zone_codes.is_empty() && self.zone_codes.len() != self.zones.len() {
            return Err(format!(
                "{} zone codes for {} zones",
                self.zone_codes.len(),
                self.zones.len()
            ));
        }
        for (i, row) in self.prices.iter().enumerate() {
            if row.len() != self.zones.len() {
                return Err(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    self.zones.len()
                ));
            }
            if let Some(j) = row.iter().position(|p| p.is_sign_negative() && !p.is_zero()) {
                return Err(format!("negative price at row {}, column {}", i, j));
            }
        }
        Ok(())
    }
}

/// Inputs of a matrix build besides the price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatrixBuildParams {
    pub margin_percent: Decimal,
    pub margin_fixed_eur: Option<Decimal>,
    pub vat_mode: VatMode,
    pub vat_rate: Decimal,
    pub delivery_mode: DeliveryMode,
    pub pickup_fee: Option<Decimal>,
    pub goods_needs_processing: bool,
    pub processing_fee: Option<Decimal>,
    pub volumetric_divisor: Option<Decimal>,
    /// Overrides the name derived from the list's carrier code.
    pub carrier_display_name: Option<String>,
}

impl Default for MatrixBuildParams {
    fn default() -> Self {
        Self {
            margin_percent: DEFAULT_QUOTE_MARGIN_PERCENT,
            margin_fixed_eur: None,
            vat_mode: VatMode::Excluded,
            vat_rate: DEFAULT_VAT_RATE,
            delivery_mode: DeliveryMode::CarrierPickup,
            pickup_fee: None,
            goods_needs_processing: false,
            processing_fee: None,
            volumetric_divisor: None,
            carrier_display_name: None,
        }
    }
}

impl MatrixBuildParams {
    pub fn with_margin(margin_percent: Decimal) -> Self {
        Self {
            margin_percent,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.vat_rate < Decimal::ZERO || self.vat_rate > Decimal::ONE_HUNDRED {
            return Err(ValidationError::InvalidInput(format!(
                "VAT rate {} out of range",
                self.vat_rate
            ))
            .into());
        }
        for (name, fee) in [
            ("pickup_fee", self.pickup_fee),
            ("processing_fee", self.processing_fee),
        ] {
            if fee.map_or(false, |f| f < Decimal::ZERO) {
                return Err(ValidationError::InvalidInput(format!("{} must not be negative", name)).into());
            }
        }
        if self.volumetric_divisor.map_or(false, |d| d <= Decimal::ZERO) {
            return Err(ValidationError::InvalidInput(
                "volumetric divisor must be positive".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
