//! SQLite storage implementation for price lists.

mod model;
mod repository;

pub use model::{PriceListAssignmentDB, PriceListDB, PriceListEntryDB};
pub use repository::PriceListRepository;
