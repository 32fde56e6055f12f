//! Parcelrate Carrier Rates Crate
//!
//! Provider-agnostic access to third-party carrier rate APIs.
//!
//! # Overview
//!
//! The crate supports:
//! - Normalized rate requests (parcels, sender, recipient)
//! - Tolerant parsing of rate responses (missing fields, numbers sent as strings)
//! - Error classification for retry decisions
//! - A shared token-bucket rate limiter that every caller of a provider goes through
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Domain Layer   | --> |   RateRequest    |
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   RateLimiter    |  (token bucket per provider)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   RateProvider   |  (HTTP rate API)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  RatesResponse   |
//!                          +------------------+
//! ```

pub mod errors;
pub mod limiter;
pub mod models;
pub mod provider;

pub use errors::{RateProbeError, RetryClass};
pub use limiter::{ProviderId, RateLimitConfig, RateLimiter};
pub use models::{Address, CarrierRate, Parcel, RateRequest, RatesResponse};
pub use provider::http::HttpRateProvider;
pub use provider::RateProvider;
