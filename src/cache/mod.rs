//! Freshgate cache system
//!
//! Three freshness caches sharing the idea of an expiry-stamped entry:
//!
//! - **TTL store**: generic key/value store with lazy expiry on read and a
//!   background sweeper
//! - **Freshness gate**: decides whether a persisted query result can be
//!   served, using an expiry buffer that adapts to the staleness window
//! - **Snapshot cache**: single-slot cache for a shared snapshot, with
//!   request-specific overlay fields recomputed on every call
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `freshgate.toml`:
//!
//! ```toml
//! [cache]
//! results_enabled = true
//! results_stale_time_seconds = 86400
//! health_ttl_ms = 180000
//! # ... see config.rs for all options
//! ```

mod clock;
mod config;
mod freshness;
pub(crate) mod lock;
mod snapshot;
mod ttl_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use freshness::{DEFAULT_EXPIRY_BUFFER_MS, FreshnessGate, expiry_buffer_ms};
pub use snapshot::{Overlay, SnapshotCache};
pub use ttl_store::TtlStore;
