//! Rate provider trait definitions.

pub mod http;

use async_trait::async_trait;

use crate::errors::RateProbeError;
use crate::limiter::RateLimitConfig;
use crate::models::{RateRequest, RatesResponse};

/// Trait for carrier rate providers.
///
/// A provider answers one rate request at a time. Callers are expected to
/// acquire a token from the shared [`RateLimiter`](crate::RateLimiter) before
/// each call, using [`RateProvider::id`] as the bucket key.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Unique identifier for this provider, used for logging and rate limiting.
    fn id(&self) -> &'static str;

    /// Rate limit the upstream API tolerates.
    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::default()
    }

    /// Quote all rates available for the request.
    ///
    /// A response with `success == false` is returned as `Ok`; only transport
    /// and protocol failures are errors.
    async fn get_rates(&self, request: &RateRequest) -> Result<RatesResponse, RateProbeError>;
}
