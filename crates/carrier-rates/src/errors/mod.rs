//! Error types for carrier rate operations.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors produced while querying a carrier rate API.
#[derive(Error, Debug)]
pub enum RateProbeError {
    /// The provider rejected the request because of its rate limit.
    #[error("Rate limited by {provider}")]
    RateLimited {
        /// Provider identifier
        provider: String,
    },

    /// The request did not complete in time.
    #[error("Request to {provider} timed out")]
    Timeout {
        /// Provider identifier
        provider: String,
    },

    /// Credentials were missing or rejected.
    #[error("Unauthorized by {provider}")]
    Unauthorized {
        /// Provider identifier
        provider: String,
    },

    /// The provider returned an error for this request.
    #[error("Provider {provider} error: {message}")]
    ProviderError {
        /// Provider identifier
        provider: String,
        /// Error message from the provider
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request failed local validation before being sent.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl RateProbeError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcelrate_carrier_rates::errors::{RateProbeError, RetryClass};
    ///
    /// let error = RateProbeError::RateLimited { provider: "RATES_API".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = RateProbeError::Unauthorized { provider: "RATES_API".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Unauthorized { .. } | Self::ValidationFailed { .. } => RetryClass::Never,

            Self::RateLimited { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,

            Self::ProviderError { .. } | Self::InvalidResponse(_) | Self::Network(_) => {
                RetryClass::NextProbe
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_never_retries() {
        let error = RateProbeError::Unauthorized {
            provider: "RATES_API".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_validation_failed_never_retries() {
        let error = RateProbeError::ValidationFailed {
            message: "no packages".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = RateProbeError::RateLimited {
            provider: "RATES_API".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_timeout_retries_with_backoff() {
        let error = RateProbeError::Timeout {
            provider: "RATES_API".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_provider_error_moves_to_next_probe() {
        let error = RateProbeError::ProviderError {
            provider: "RATES_API".to_string(),
            message: "HTTP 502".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProbe);
    }

    #[test]
    fn test_invalid_response_moves_to_next_probe() {
        let error = RateProbeError::InvalidResponse("expected object".to_string());
        assert_eq!(error.retry_class(), RetryClass::NextProbe);
    }
}
