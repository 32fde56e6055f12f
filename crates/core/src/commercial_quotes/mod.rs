//! Commercial quotes module - prospect quotes, revision chains and conversion.

pub mod clauses;
mod commercial_quotes_errors;
mod commercial_quotes_model;
mod commercial_quotes_service;
mod commercial_quotes_traits;

#[cfg(test)]
mod commercial_quotes_service_tests;

#[cfg(test)]
pub(crate) mod commercial_quotes_test_utils;

pub use clauses::{default_clauses, merge_with_custom_clauses, ClauseTerms};
pub use commercial_quotes_errors::QuoteError;
pub use commercial_quotes_model::{
    ClauseType, CommercialQuote, DeliveryTerms, NewCommercialQuote, ProspectContact,
    QuoteClause, QuoteConversion, QuoteConversionInput, QuoteEvent, QuoteEventType,
    QuotePipelineStats, QuoteRenewalInput, QuoteRevisionInput, QuoteStatus, QuoteStatusChange,
};
pub use commercial_quotes_service::QuoteService;
pub use commercial_quotes_traits::{QuoteRepositoryTrait, QuoteServiceTrait};
