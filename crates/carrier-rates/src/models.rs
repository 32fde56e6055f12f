//! Request and response types for carrier rate APIs.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One physical package. Dimensions in centimetres, weight in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub weight: Decimal,
}

/// Postal address in the shape rate APIs expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub name: String,
    pub street1: String,
    pub city: String,
    /// Province code for Italian addresses.
    pub state: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2.
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A rate quotation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub packages: Vec<Parcel>,
    pub ship_from: Address,
    pub ship_to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod_value: Option<Decimal>,
    /// Courier configuration whose credentials are used upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
}

/// A single rate returned by the upstream API.
///
/// Upstream payloads are loose: amounts arrive either as JSON numbers or as
/// strings, and most fields may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierRate {
    #[serde(rename = "carrierCode", default)]
    pub carrier_code: String,
    #[serde(rename = "contractCode", default)]
    pub contract_code: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub fuel: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub weight_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub insurance_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cod_price: Option<Decimal>,
}

impl CarrierRate {
    /// Whether this rate belongs to the given carrier and contract.
    ///
    /// Carrier codes must match exactly (ignoring case); the contract code only
    /// has to contain the target, since upstream codes often carry a suffix.
    pub fn matches_contract(&self, carrier_code: &str, contract_code: &str) -> bool {
        self.carrier_code.eq_ignore_ascii_case(carrier_code)
            && self
                .contract_code
                .to_lowercase()
                .contains(&contract_code.to_lowercase())
    }
}

/// Response envelope of a rate quotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub rates: Vec<CarrierRate>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RatesResponse {
    /// A failed response with no rates.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            rates: Vec::new(),
            error: Some(message.into()),
        }
    }
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    })
}
