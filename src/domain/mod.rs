//! Domain layer types and invariants.

pub mod health;
pub mod query_history;
pub mod types;
