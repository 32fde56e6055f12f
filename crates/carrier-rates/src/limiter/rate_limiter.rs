//! Token bucket rate limiter for carrier rate providers.
//!
//! One bucket per provider. Every probe task acquires a token from the same
//! limiter instance, so the upstream request rate is bounded no matter how
//! many probes run concurrently.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Type alias for provider identifier.
pub type ProviderId = Cow<'static, str>;

/// Default rate limit: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default bucket capacity.
const DEFAULT_BURST_CAPACITY: f64 = 5.0;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn from_config(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_capacity.max(1.0);
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: (config.requests_per_minute.max(1)) as f64 / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Rate limiter configuration for a provider.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Sustained requests per minute.
    pub requests_per_minute: u32,
    /// Requests allowed back to back before throttling starts.
    pub burst_capacity: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BURST_CAPACITY,
        }
    }
}

/// Token bucket rate limiter keyed by provider.
///
/// Buckets are created lazily, from the provider's configuration when one was
/// registered with [`RateLimiter::configure`], otherwise from the defaults.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    configs: Mutex<HashMap<String, RateLimitConfig>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            configs: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the buckets mutex, recovering from poison if necessary.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_configs(&self) -> MutexGuard<'_, HashMap<String, RateLimitConfig>> {
        self.configs.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter configs mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Configure rate limits for a provider. Resets its bucket.
    pub fn configure(&self, provider: &ProviderId, config: RateLimitConfig) {
        let mut configs = self.lock_configs();
        configs.insert(provider.to_string(), config);
        drop(configs);

        let mut buckets = self.lock_buckets();
        buckets.remove(provider.as_ref());
    }

    /// Wait until a token is available for the provider.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&self, provider: &ProviderId) -> Duration {
        let started = Instant::now();
        loop {
            let wait_time = {
                let mut buckets = self.lock_buckets();
                let bucket = buckets
                    .entry(provider.to_string())
                    .or_insert_with(|| self.create_bucket(provider));

                if bucket.try_acquire() {
                    return started.elapsed();
                }

                bucket.time_until_available()
            };

            if wait_time > Duration::ZERO {
                debug!(
                    "Rate limiter: waiting {:?} for provider '{}'",
                    wait_time, provider
                );
                tokio::time::sleep(wait_time).await;
            }
        }
    }

    /// Try to acquire a token without waiting.
    pub fn try_acquire(&self, provider: &ProviderId) -> bool {
        let mut buckets = self.lock_buckets();
        let bucket = buckets
            .entry(provider.to_string())
            .or_insert_with(|| self.create_bucket(provider));

        bucket.try_acquire()
    }

    /// Tokens currently available for a provider.
    pub fn remaining_tokens(&self, provider: &ProviderId) -> f64 {
        let mut buckets = self.lock_buckets();

        if let Some(bucket) = buckets.get_mut(provider.as_ref()) {
            bucket.refill();
            bucket.tokens
        } else {
            self.config_for(provider).burst_capacity.max(1.0)
        }
    }

    pub fn reset(&self, provider: &ProviderId) {
        let mut buckets = self.lock_buckets();
        buckets.remove(provider.as_ref());
    }

    fn config_for(&self, provider: &ProviderId) -> RateLimitConfig {
        self.lock_configs()
            .get(provider.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    fn create_bucket(&self, provider: &ProviderId) -> TokenBucket {
        TokenBucket::from_config(&self.config_for(provider))
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
