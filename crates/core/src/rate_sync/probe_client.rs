//! Rate probe client.
//!
//! `CarrierRatesClient` bridges the sync service to the `carrier-rates` crate.
//! Every call goes through the shared token-bucket limiter before it reaches
//! the provider, so concurrent probes never exceed the upstream rate limit.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use parcelrate_carrier_rates::{
    ProviderId, RateLimiter, RateProbeError, RateProvider, RateRequest, RatesResponse,
};

/// Source of carrier rate quotations for synthetic probe shipments.
#[async_trait]
pub trait RateProbeClient: Send + Sync {
    /// Quote every rate available for `request`. A non-success response is
    /// returned as `Ok` and means "no rates".
    async fn get_rates(&self, request: &RateRequest) -> Result<RatesResponse, RateProbeError>;
}

/// Rate-limited client over a single rate provider.
pub struct CarrierRatesClient {
    provider: Arc<dyn RateProvider>,
    limiter: Arc<RateLimiter>,
    provider_id: ProviderId,
}

impl CarrierRatesClient {
    /// Registers the provider's rate limit with `limiter`.
    pub fn new(provider: Arc<dyn RateProvider>, limiter: Arc<RateLimiter>) -> Self {
        let provider_id: ProviderId = Cow::Borrowed(provider.id());
        limiter.configure(&provider_id, provider.rate_limit());
        Self {
            provider,
            limiter,
            provider_id,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }
}

#[async_trait]
impl RateProbeClient for CarrierRatesClient {
    async fn get_rates(&self, request: &RateRequest) -> Result<RatesResponse, RateProbeError> {
        let waited = self.limiter.acquire(&self.provider_id).await;
        if !waited.is_zero() {
            debug!(
                "Probe to {} held back {:?} by the rate limiter",
                self.provider_id, waited
            );
        }
        self.provider.get_rates(request).await
    }
}
