//! Parcelrate Core - Domain entities, services, and traits.
//!
//! This crate contains the pricing logic: applicable price list resolution,
//! rule-based price calculation, best-price selection, quote matrix building,
//! the commercial quote lifecycle and incremental matrix synchronization.
//! It is storage-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod action_result;
pub mod actors;
pub mod commercial_quotes;
pub mod constants;
pub mod errors;
pub mod matrix;
pub mod price_lists;
pub mod pricing;
pub mod rate_sync;
pub mod zones;

pub use action_result::ActionResult;
pub use actors::{Actor, ActorRole};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
