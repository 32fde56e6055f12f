//! HTTP rate provider.
//!
//! Talks to a JSON rate API exposing `POST {base_url}/shipping/rates`.
//! The API key is sent as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::RateProbeError;
use crate::limiter::RateLimitConfig;
use crate::models::{RateRequest, RatesResponse};
use crate::provider::RateProvider;

const PROVIDER_ID: &str = "RATES_API";
const RATES_ENDPOINT: &str = "/shipping/rates";

/// Error body returned by the rate API on failure.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// JSON rate API provider.
pub struct HttpRateProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    rate_limit: RateLimitConfig,
}

impl HttpRateProvider {
    /// Create a provider for the given base URL.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// Override the rate limit reported to the limiter.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    async fn post(&self, request: &RateRequest) -> Result<String, RateProbeError> {
        let url = format!("{}{}", self.base_url, RATES_ENDPOINT);

        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!(
            "Rates request: {} packages to {} {}",
            request.packages.len(),
            request.ship_to.postal_code,
            request.ship_to.country
        );

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RateProbeError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                RateProbeError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Request failed: {}", e),
                }
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RateProbeError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RateProbeError::Unauthorized {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(message) = error_resp.error.or(error_resp.message) {
                    return Err(RateProbeError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message,
                    });
                }
            }

            return Err(RateProbeError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .text()
            .await
            .map_err(|e| RateProbeError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimitConfig {
        self.rate_limit.clone()
    }

    async fn get_rates(&self, request: &RateRequest) -> Result<RatesResponse, RateProbeError> {
        if request.packages.is_empty() {
            return Err(RateProbeError::ValidationFailed {
                message: "at least one package is required".to_string(),
            });
        }

        let body = self.post(request).await?;
        let parsed = parse_rates_body(&body)?;

        if !parsed.success {
            warn!(
                "Rates API returned success=false for {}: {}",
                request.ship_to.postal_code,
                parsed.error.as_deref().unwrap_or("no error message")
            );
        }

        Ok(parsed)
    }
}

/// Parse a rates body. A bare array of rates is accepted as a successful response.
fn parse_rates_body(body: &str) -> Result<RatesResponse, RateProbeError> {
    if body.trim_start().starts_with('[') {
        let rates = serde_json::from_str(body)
            .map_err(|e| RateProbeError::InvalidResponse(e.to_string()))?;
        return Ok(RatesResponse {
            success: true,
            rates,
            error: None,
        });
    }

    serde_json::from_str(body).map_err(|e| RateProbeError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Parcel};
    use rust_decimal_macros::dec;

    fn address(city: &str) -> Address {
        Address {
            name: "Test".to_string(),
            street1: "Via Roma 1".to_string(),
            city: city.to_string(),
            state: "RM".to_string(),
            postal_code: "00100".to_string(),
            country: "IT".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_parse_envelope() {
        let body = r#"{"success": true, "rates": [{"carrierCode": "gls", "contractCode": "GLS-1", "total_price": "5.10"}]}"#;
        let parsed = parse_rates_body(body).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.rates[0].total_price, Some(dec!(5.10)));
    }

    #[test]
    fn test_parse_bare_array() {
        let body = r#"[{"carrierCode": "brt", "contractCode": "BRT-1", "total_price": 6}]"#;
        let parsed = parse_rates_body(body).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.rates.len(), 1);
    }

    #[test]
    fn test_parse_garbage_is_invalid_response() {
        let err = parse_rates_body("<html>").unwrap_err();
        assert!(matches!(err, RateProbeError::InvalidResponse(_)));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = RateRequest {
            packages: vec![Parcel {
                length: dec!(30),
                width: dec!(20),
                height: dec!(15),
                weight: dec!(2),
            }],
            ship_from: address("Roma"),
            ship_to: address("Milano"),
            notes: None,
            insurance_value: None,
            cod_value: None,
            config_id: Some("cfg-1".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("shipFrom").is_some());
        assert!(json.get("shipTo").is_some());
        assert_eq!(json["configId"], "cfg-1");
        assert!(json.get("notes").is_none());
    }

    #[tokio::test]
    async fn test_empty_packages_rejected_before_sending() {
        let provider = HttpRateProvider::new("http://127.0.0.1:9", None, Duration::from_secs(1));
        let request = RateRequest {
            packages: vec![],
            ship_from: address("Roma"),
            ship_to: address("Milano"),
            notes: None,
            insurance_value: None,
            cod_value: None,
            config_id: None,
        };
        let err = provider.get_rates(&request).await.unwrap_err();
        assert!(matches!(err, RateProbeError::ValidationFailed { .. }));
    }
}
