//! Standard quote clauses.

use rust_decimal::Decimal;

use crate::commercial_quotes::commercial_quotes_model::{ClauseType, DeliveryTerms, QuoteClause};
use crate::constants::DEFAULT_VOLUMETRIC_DIVISOR;
use crate::matrix::DeliveryMode;
use crate::price_lists::VatMode;

/// Everything the standard clause set depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseTerms {
    pub vat_mode: VatMode,
    pub vat_rate: Decimal,
    pub delivery: DeliveryTerms,
    pub validity_days: i32,
    pub volumetric_divisor: Option<Decimal>,
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn paid_fee(fee: Option<Decimal>) -> Option<Decimal> {
    fee.filter(|f| *f > Decimal::ZERO)
}

fn pickup_clause(delivery: &DeliveryTerms) -> QuoteClause {
    match (delivery.delivery_mode, paid_fee(delivery.pickup_fee)) {
        (DeliveryMode::CarrierPickup, None) => QuoteClause::standard(
            "Pickup",
            "Pickup at your premises by the carrier's courier is free of charge.",
        ),
        (DeliveryMode::CarrierPickup, Some(fee)) => QuoteClause::standard(
            "Pickup",
            format!(
                "Pickup at your premises by the carrier's courier carries a supplement of EUR {} per pickup.",
                money(fee)
            ),
        ),
        (DeliveryMode::OwnFleet, None) => QuoteClause::standard(
            "Pickup",
            "Goods are collected with our own fleet and handed to the carrier, free of charge.",
        ),
        (DeliveryMode::OwnFleet, Some(fee)) => QuoteClause::standard(
            "Pickup",
            format!(
                "Goods are collected with our own fleet and handed to the carrier, with a supplement of EUR {} per pickup.",
                money(fee)
            ),
        ),
        (DeliveryMode::ClientDropoff, _) => QuoteClause::standard(
            "Drop-off",
            "Goods are delivered by the client to our drop-off point or warehouse.",
        ),
    }
}

fn processing_clause(delivery: &DeliveryTerms) -> QuoteClause {
    if !delivery.goods_needs_processing {
        return QuoteClause::standard(
            "Processing",
            "Goods are handed over packed and labelled, ready to ship.",
        );
    }
    match paid_fee(delivery.processing_fee) {
        Some(fee) => QuoteClause::standard(
            "Processing",
            format!(
                "Labelling and packing are performed by us at EUR {} per shipment.",
                money(fee)
            ),
        ),
        None => QuoteClause::standard(
            "Processing",
            "Labelling and packing are performed by us at no extra cost.",
        ),
    }
}

/// The standard clause set: always eight clauses, in a fixed order.
pub fn default_clauses(terms: &ClauseTerms) -> Vec<QuoteClause> {
    let vat = match terms.vat_mode {
        VatMode::Excluded => format!(
            "Prices are VAT excluded. VAT at {}% is charged on invoice.",
            terms.vat_rate.normalize()
        ),
        VatMode::Included => format!(
            "Prices include VAT at {}%.",
            terms.vat_rate.normalize()
        ),
    };
    let divisor = terms
        .volumetric_divisor
        .unwrap_or(DEFAULT_VOLUMETRIC_DIVISOR)
        .normalize();

    vec![
        QuoteClause::standard("VAT", vat),
        QuoteClause::standard(
            "Fuel",
            "Prices include the fuel surcharge in force at the date of the quote.",
        ),
        QuoteClause::standard(
            "Volumetric weight",
            format!(
                "The taxable weight is the greater of actual and volumetric weight (L x W x H cm / {}).",
                divisor
            ),
        ),
        pickup_clause(&terms.delivery),
        processing_clause(&terms.delivery),
        QuoteClause::standard(
            "Tracking",
            "Every shipment includes online tracking and delivery notifications.",
        ),
        QuoteClause::standard(
            "Storage",
            "Undeliverable parcels are held in storage and returned at the sender's cost.",
        ),
        QuoteClause::standard(
            "Validity",
            format!("This offer is valid for {} days from sending.", terms.validity_days),
        ),
    ]
}

/// Standard clauses followed by the custom clauses of `existing`.
pub fn merge_with_custom_clauses(
    defaults: Vec<QuoteClause>,
    existing: &[QuoteClause],
) -> Vec<QuoteClause> {
    let mut merged = defaults;
    merged.extend(
        existing
            .iter()
            .filter(|c| c.clause_type == ClauseType::Custom)
            .cloned(),
    );
    merged
}
