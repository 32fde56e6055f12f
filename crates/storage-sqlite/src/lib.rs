//! SQLite storage implementation for Parcelrate.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `parcelrate-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for price lists and commercial quotes
//! - Database-specific model types (with Diesel derives)
//!
//! All writes go through a single writer actor, one transaction per job. A
//! multi-row entry insert is therefore atomic even when it spans several
//! statements.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod commercial_quotes;
pub mod price_lists;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, open, prepare_database_file, run_migrations,
    spawn_writer, DbConnection, DbPool, WriteHandle,
};

pub use commercial_quotes::QuoteRepository;
pub use price_lists::PriceListRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from parcelrate-core for convenience
pub use parcelrate_core::errors::{DatabaseError, Error, Result};
