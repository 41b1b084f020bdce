//! Application services layer.

pub mod error;
pub mod health;
pub mod repos;
pub mod results_cache;
