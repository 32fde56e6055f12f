//! Rate limiting shared by every caller of a rate provider.

mod rate_limiter;

pub use rate_limiter::{ProviderId, RateLimitConfig, RateLimiter};
