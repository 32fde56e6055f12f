//! SQLite storage implementation for commercial quotes.

mod model;
mod repository;

pub use model::{CommercialQuoteDB, QuoteEventDB, QuoteStatusChangeDB};
pub use repository::QuoteRepository;
