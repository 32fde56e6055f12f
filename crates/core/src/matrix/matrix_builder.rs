//! Projection of a cost price list into a sell matrix.
//!
//! ```text
//! cost = base * (1 + fuel%) + island          (VAT removed if the list includes it)
//! sell = cost * (1 + margin%) + margin_fixed  (VAT added if the output includes it)
//! ```

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;

use crate::constants::DEFAULT_VOLUMETRIC_DIVISOR;
use crate::matrix::matrix_model::{MatrixBuildParams, MatrixCell, PriceMatrixSnapshot, WeightRange};
use crate::price_lists::{PriceList, PriceListEntry, ServiceType, VatMode};
use crate::pricing::round_money;
use crate::zones::{normalize_zone_code, zone_display_name, zone_sort_index};

const KNOWN_CARRIERS: [(&str, &str); 10] = [
    ("gls", "GLS"),
    ("brt", "BRT"),
    ("sda", "SDA"),
    ("dhl", "DHL"),
    ("ups", "UPS"),
    ("fedex", "FedEx"),
    ("tnt", "TNT"),
    ("postedeliverybusiness", "PosteDeliveryBusiness"),
    ("posteitaliane", "Poste Italiane"),
    ("nexive", "Nexive"),
];

/// Display name for a carrier code such as `gls-GLS-5000` or `postedeliverybusiness-SDA`.
pub fn format_carrier_display_name(carrier_code: &str) -> String {
    let prefix = carrier_code
        .trim()
        .split('-')
        .next()
        .filter(|p| !p.is_empty())
        .unwrap_or(carrier_code);
    let lower = prefix.to_lowercase();
    KNOWN_CARRIERS
        .iter()
        .find(|(code, _)| *code == lower)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| prefix.to_uppercase())
}

fn percent_factor(percent: Decimal) -> Decimal {
    Decimal::ONE + percent / Decimal::ONE_HUNDRED
}

/// Cost of one entry, VAT-excluded.
fn entry_cost(entry: &PriceListEntry, list: &PriceList) -> Decimal {
    let cost = entry.base_price * percent_factor(entry.fuel_surcharge_percent) + entry.island_surcharge;
    match list.vat_mode {
        VatMode::Included => cost / percent_factor(list.vat_rate),
        VatMode::Excluded => cost,
    }
}

fn sell_price(cost: Decimal, params: &MatrixBuildParams) -> Decimal {
    let sell = cost * percent_factor(params.margin_percent)
        + params.margin_fixed_eur.unwrap_or(Decimal::ZERO);
    let sell = match params.vat_mode {
        VatMode::Included => sell * percent_factor(params.vat_rate),
        VatMode::Excluded => sell,
    };
    round_money(sell)
}

/// Build the sell matrix of `list` from its entries.
///
/// Only standard-service rows are used. A list without entries gives an empty
/// grid. Cells with no entry are zero and reported in `missing_cells`; negative
/// cells are clamped to zero and reported in `clamped_cells`. Pure apart from
/// the timestamp passed in.
pub fn build_matrix(
    list: &PriceList,
    entries: &[PriceListEntry],
    params: &MatrixBuildParams,
    generated_at: DateTime<Utc>,
) -> PriceMatrixSnapshot {
    let standard: Vec<&PriceListEntry> = entries
        .iter()
        .filter(|e| e.service_type == ServiceType::Standard)
        .collect();

    let mut zone_codes: Vec<String> = standard
        .iter()
        .map(|e| normalize_zone_code(&e.zone_code))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    zone_codes.sort_by(|a, b| zone_sort_index(a).cmp(&zone_sort_index(b)).then(a.cmp(b)));

    let brackets: BTreeSet<(Decimal, Decimal)> = standard
        .iter()
        .map(|e| (e.weight_from.normalize(), e.weight_to.normalize()))
        .collect();
    let weight_ranges: Vec<WeightRange> = brackets
        .iter()
        .map(|(from, to)| WeightRange::new(*from, *to))
        .collect();

    let mut cells: HashMap<(Decimal, Decimal, String), &PriceListEntry> = HashMap::new();
    for entry in &standard {
        cells
            .entry((
                entry.weight_from.normalize(),
                entry.weight_to.normalize(),
                normalize_zone_code(&entry.zone_code),
            ))
            .or_insert(entry);
    }

    let mut prices = Vec::with_capacity(weight_ranges.len());
    let mut clamped_cells = Vec::new();
    let mut missing_cells = Vec::new();

    for (weight_index, (from, to)) in brackets.iter().enumerate() {
        let mut row = Vec::with_capacity(zone_codes.len());
        for (zone_index, zone) in zone_codes.iter().enumerate() {
            let cell = MatrixCell {
                weight_index,
                zone_index,
            };
            let Some(entry) = cells.get(&(*from, *to, zone.clone())) else {
                missing_cells.push(cell);
                row.push(Decimal::ZERO);
                continue;
            };
            let price = sell_price(entry_cost(entry, list), params);
            if price < Decimal::ZERO {
                warn!(
                    "Clamping negative price {} for {} {} kg in price list {}",
                    price, zone, to, list.id
                );
                clamped_cells.push(cell);
                row.push(Decimal::ZERO);
            } else {
                row.push(price);
            }
        }
        prices.push(row);
    }

    let mut services_included = vec!["base_rate".to_string()];
    if standard.iter().any(|e| e.fuel_surcharge_percent > Decimal::ZERO) {
        services_included.push("fuel_surcharge".to_string());
    }
    if standard.iter().any(|e| e.island_surcharge > Decimal::ZERO) {
        services_included.push("island_surcharge".to_string());
    }

    let carrier_display_name = params.carrier_display_name.clone().unwrap_or_else(|| {
        list.effective_metadata()
            .carrier_code
            .map(|code| format_carrier_display_name(&code))
            .unwrap_or_else(|| list.name.clone())
    });

    PriceMatrixSnapshot {
        zones: zone_codes.iter().map(|c| zone_display_name(c)).collect(),
        zone_codes,
        weight_ranges,
        prices,
        services_included,
        carrier_display_name,
        vat_mode: params.vat_mode,
        vat_rate: params.vat_rate,
        margin_percent: params.margin_percent,
        margin_fixed_eur: params.margin_fixed_eur,
        volumetric_divisor: params.volumetric_divisor.unwrap_or(DEFAULT_VOLUMETRIC_DIVISOR),
        delivery_mode: params.delivery_mode,
        pickup_fee: params.pickup_fee,
        goods_needs_processing: params.goods_needs_processing,
        processing_fee: params.processing_fee,
        clamped_cells,
        missing_cells,
        generated_at,
    }
}
