//! Pricing module - shipment price resolution, rule evaluation and best-price selection.

pub mod best_price;
pub mod calculator;
mod pricing_errors;
mod pricing_model;
mod pricing_service;
mod pricing_traits;
pub mod resolver;
pub mod rules;

#[cfg(test)]
mod pricing_service_tests;

pub use best_price::{select_best, BestPriceResult, PriceProvenance};
pub use calculator::{
    apply_surcharges, calculate_price, find_entry, round_money, split_vat, taxable_weight,
    volumetric_weight, SurchargeBreakdown, TaxableWeight,
};
pub use pricing_errors::PricingError;
pub use pricing_model::{
    Destination, Dimensions, PriceCalculationResult, PriceLine, PriceLineKind, PricingSettings,
    ShipmentDescriptor,
};
pub use pricing_service::PricingService;
pub use pricing_traits::PricingServiceTrait;
pub use resolver::{ApplicableListResolver, PriceListSource, ResolvedPriceList};
pub use rules::{apply_rules, rule_matches, RuleContext, RuleOutcome};
