use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Not authorized to sync: {0}")]
    Unauthorized(String),

    #[error("Price list is missing '{0}' metadata")]
    MissingMetadata(String),

    #[error("Price list {0} not found")]
    PriceListNotFound(String),
}
