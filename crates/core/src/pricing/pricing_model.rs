//! Shipment and price calculation models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_VOLUMETRIC_DIVISOR;
use crate::price_lists::{ServiceType, VatMode};
use crate::pricing::PricingError;

/// Where a shipment goes. At least one geographic key is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Destination {
    pub zip: Option<String>,
    pub province: Option<String>,
    pub region: Option<String>,
    /// ISO 3166-1 alpha-2.
    pub country: Option<String>,
    /// Pre-resolved pricing zone; skips zone resolution when present.
    pub zone_code: Option<String>,
    /// Destination carries the island fixed surcharge.
    pub is_island: bool,
    /// Destination is inside a limited-traffic zone.
    pub is_ztl: bool,
}

impl Destination {
    pub fn has_geographic_key(&self) -> bool {
        [
            &self.zip,
            &self.province,
            &self.region,
            &self.country,
            &self.zone_code,
        ]
        .iter()
        .any(|v| v.as_deref().map_or(false, |s| !s.trim().is_empty()))
    }
}

/// Package dimensions in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub length_cm: Decimal,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
}

/// What is being priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDescriptor {
    pub weight_kg: Decimal,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    pub destination: Destination,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default)]
    pub courier_id: Option<String>,
    #[serde(default)]
    pub declared_value: Option<Decimal>,
    #[serde(default)]
    pub insurance: bool,
    #[serde(default)]
    pub cash_on_delivery: bool,
}

impl ShipmentDescriptor {
    /// A standard shipment of `weight_kg` to an already-resolved zone.
    pub fn to_zone(weight_kg: Decimal, zone_code: impl Into<String>) -> Self {
        Self {
            weight_kg,
            dimensions: None,
            destination: Destination {
                zone_code: Some(zone_code.into()),
                ..Default::default()
            },
            service_type: ServiceType::Standard,
            courier_id: None,
            declared_value: None,
            insurance: false,
            cash_on_delivery: false,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), PricingError> {
        if self.weight_kg <= Decimal::ZERO {
            return Err(PricingError::InvalidShipmentDescriptor(
                "weight must be greater than zero".to_string(),
            ));
        }
        if !self.destination.has_geographic_key() {
            return Err(PricingError::InvalidShipmentDescriptor(
                "destination needs a zip, province, region, country or zone".to_string(),
            ));
        }
        if let Some(d) = &self.dimensions {
            if d.length_cm <= Decimal::ZERO || d.width_cm <= Decimal::ZERO || d.height_cm <= Decimal::ZERO {
                return Err(PricingError::InvalidShipmentDescriptor(
                    "dimensions must be positive".to_string(),
                ));
            }
        }
        if self.insurance && self.declared_value.map_or(true, |v| v <= Decimal::ZERO) {
            return Err(PricingError::InvalidShipmentDescriptor(
                "insurance requires a positive declared value".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLineKind {
    Base,
    FuelSurcharge,
    Insurance,
    CashOnDelivery,
    IslandSurcharge,
    ZtlSurcharge,
    Rule,
    Vat,
}

/// One line of the price breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLine {
    pub kind: PriceLineKind,
    pub label: String,
    pub amount: Decimal,
}

impl PriceLine {
    pub fn new(kind: PriceLineKind, label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            kind,
            label: label.into(),
            amount,
        }
    }
}

/// Result of pricing one shipment against one price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalculationResult {
    pub price_list_id: String,
    pub price_list_name: String,
    pub zone_code: String,
    pub service_type: ServiceType,
    pub actual_weight: Decimal,
    pub volumetric_weight: Option<Decimal>,
    pub taxable_weight: Decimal,
    pub base_price: Decimal,
    pub surcharges_total: Decimal,
    pub rules_adjustment: Decimal,
    pub total_excl_vat: Decimal,
    pub vat_mode: VatMode,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_incl_vat: Decimal,
    /// Price compared across lists: the VAT-excluded total.
    pub final_price: Decimal,
    pub applied_rule_ids: Vec<String>,
    pub breakdown: Vec<PriceLine>,
}

/// Tunables of the price calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingSettings {
    pub volumetric_divisor: Decimal,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            volumetric_divisor: DEFAULT_VOLUMETRIC_DIVISOR,
        }
    }
}
