//! The `{success, data?, error?}` envelope returned at the public boundary.

use log::error;
use serde::{Deserialize, Serialize};

use crate::actors::Actor;
use crate::commercial_quotes::QuoteError;
use crate::errors::{DatabaseError, Error, Result};
use crate::pricing::PricingError;
use crate::rate_sync::SyncError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Converts an operation result, logging the original error.
    ///
    /// Administrators get the full error text, everybody else a message
    /// without internal identifiers.
    pub fn from_result(result: Result<T>, actor: Option<&Actor>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                error!(
                    "Operation failed for {}: {}",
                    actor.map_or("anonymous", |a| a.id.as_str()),
                    err
                );
                Self::failure(public_message(&err, actor))
            }
        }
    }
}

/// The error text shown to `actor`.
pub fn public_message(err: &Error, actor: Option<&Actor>) -> String {
    if actor.map_or(false, |a| a.is_admin()) {
        return err.to_string();
    }
    match err {
        Error::Validation(e) => e.to_string(),
        Error::Database(DatabaseError::NotFound(_)) => "Not found".to_string(),
        Error::Pricing(PricingError::NotAuthenticated) => "Not authenticated".to_string(),
        Error::Pricing(PricingError::Unauthorized(_)) => "Not authorized".to_string(),
        Error::Pricing(PricingError::PriceListNotFound(_)) => "Not found".to_string(),
        Error::Pricing(e) => e.to_string(),
        Error::Quote(QuoteError::QuoteNotFound(_)) => "Not found".to_string(),
        Error::Quote(QuoteError::AlreadyConverted(_)) => "Quote already converted".to_string(),
        Error::Quote(QuoteError::RevisionConflict(_)) => {
            "Another revision was saved at the same time, please retry".to_string()
        }
        Error::Quote(e) => e.to_string(),
        Error::Sync(SyncError::Unauthorized(_)) => "Not authorized".to_string(),
        Error::Sync(SyncError::PriceListNotFound(_)) => "Not found".to_string(),
        Error::Sync(e) => e.to_string(),
        _ => "Internal error".to_string(),
    }
}
