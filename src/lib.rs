//! Freshness caching for query results and instance health snapshots.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
