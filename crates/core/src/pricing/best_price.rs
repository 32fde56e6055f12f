//! Reseller vs. master price selection.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pricing_errors::PricingError;
use super::pricing_model::PriceCalculationResult;

/// Where the selected price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceProvenance {
    /// The reseller's own price list.
    Reseller,
    /// The platform master list reached through the resolution cascade.
    Master,
    /// Plain resolution for actors without reseller capability.
    Default,
}

impl fmt::Display for PriceProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriceProvenance::Reseller => "reseller",
            PriceProvenance::Master => "master",
            PriceProvenance::Default => "default",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPriceResult {
    pub best_price: PriceCalculationResult,
    pub reseller_price: Option<PriceCalculationResult>,
    pub master_price: Option<PriceCalculationResult>,
    pub api_source: PriceProvenance,
    /// `reseller - master`, present only when both prices were computed.
    pub price_difference: Option<Decimal>,
}

impl BestPriceResult {
    /// Wraps a single resolution for actors that only have one price source.
    pub fn single(price: PriceCalculationResult) -> Self {
        Self {
            best_price: price,
            reseller_price: None,
            master_price: None,
            api_source: PriceProvenance::Default,
            price_difference: None,
        }
    }
}

/// Picks the lower final price. Ties go to the reseller.
///
/// A side that failed to price is skipped; when both are missing the caller
/// gets `NoApplicablePriceList`.
pub fn select_best(
    reseller: Option<PriceCalculationResult>,
    master: Option<PriceCalculationResult>,
) -> Result<BestPriceResult, PricingError> {
    let (best, source) = match (&reseller, &master) {
        (Some(r), Some(m)) if r.final_price <= m.final_price => (r.clone(), PriceProvenance::Reseller),
        (Some(_), Some(m)) => (m.clone(), PriceProvenance::Master),
        (Some(r), None) => (r.clone(), PriceProvenance::Reseller),
        (None, Some(m)) => (m.clone(), PriceProvenance::Master),
        (None, None) => return Err(PricingError::NoApplicablePriceList),
    };

    let price_difference = match (&reseller, &master) {
        (Some(r), Some(m)) => Some(r.final_price - m.final_price),
        _ => None,
    };

    Ok(BestPriceResult {
        best_price: best,
        reseller_price: reseller,
        master_price: master,
        api_source: source,
        price_difference,
    })
}
