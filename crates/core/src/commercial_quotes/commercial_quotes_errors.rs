use thiserror::Error;

use crate::commercial_quotes::commercial_quotes_model::QuoteStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("Quote {0} not found")]
    QuoteNotFound(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: QuoteStatus, to: QuoteStatus },

    #[error("Cannot send a quote in status {0}")]
    NotDraftOrNegotiating(QuoteStatus),

    #[error("Quote {0} was already converted")]
    AlreadyConverted(String),

    #[error("Only expired quotes can be renewed, quote is {0}")]
    NotExpired(QuoteStatus),

    #[error("Only accepted quotes can be converted, quote is {0}")]
    NotAccepted(QuoteStatus),

    #[error("Only drafts can be deleted, quote is {0}")]
    OnlyDraftDeletable(QuoteStatus),

    #[error("Invalid price matrix: {0}")]
    InvalidMatrixOverride(String),

    #[error("Concurrent revisions on chain {0}, retry")]
    RevisionConflict(String),
}
