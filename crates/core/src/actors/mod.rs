//! Actors - the authenticated caller of every operation.

mod actors_model;

pub use actors_model::{Actor, ActorRole};
