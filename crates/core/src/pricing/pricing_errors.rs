//! Pricing error types.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("No applicable price list")]
    NoApplicablePriceList,

    #[error("No applicable rate for zone {zone_code} at {weight} kg")]
    NoApplicableRate { zone_code: String, weight: Decimal },

    #[error("Invalid shipment: {0}")]
    InvalidShipmentDescriptor(String),

    #[error("Price list {0} not found")]
    PriceListNotFound(String),
}
