//! In-process key/value store with per-entry expiry and a background sweeper.
//!
//! Reads check expiry lazily and never evict; the sweeper only bounds memory
//! held by keys that are written once and never read again.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use super::clock::{Clock, duration_millis};
use super::config::CacheConfig;
use super::lock::{mutex_lock, rw_read, rw_write};

const SOURCE: &str = "cache::ttl_store";

const METRIC_TTL_STORE_HIT: &str = "freshgate_ttl_store_hit_total";
const METRIC_TTL_STORE_MISS: &str = "freshgate_ttl_store_miss_total";
const METRIC_TTL_STORE_SWEPT: &str = "freshgate_ttl_store_swept_total";

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at_ms: i64,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// State shared between the store handle and its sweeper task.
struct Entries<V> {
    map: RwLock<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V> Entries<V> {
    fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut map = rw_write(&self.map, SOURCE, "purge_expired");
        let before = map.len();
        map.retain(|_, entry| entry.expires_at_ms >= now);
        before - map.len()
    }
}

/// Generic expiry-aware store.
///
/// Owns exactly one sweeper task, started on construction and stopped by
/// [`TtlStore::flush_all`] or drop.
pub struct TtlStore<V> {
    entries: Arc<Entries<V>>,
    default_ttl: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> TtlStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a store and start its sweeper.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = Arc::new(Entries {
            map: RwLock::new(HashMap::new()),
            clock,
        });
        let sweeper = spawn_sweeper(Arc::downgrade(&entries), config.store_sweep_interval());

        Self {
            entries,
            default_ttl: config.store_default_ttl(),
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    /// Returns the value if present and not yet expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.entries.clock.now_millis();
        let value = rw_read(&self.entries.map, SOURCE, "get")
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());

        let metric = if value.is_some() {
            METRIC_TTL_STORE_HIT
        } else {
            METRIC_TTL_STORE_MISS
        };
        counter!(metric).increment(1);

        value
    }

    /// Store `value` under `key` with the configured default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key`, replacing any existing entry.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at_ms = self
            .entries
            .clock
            .now_millis()
            .saturating_add(duration_millis(ttl));

        rw_write(&self.entries.map, SOURCE, "set").insert(
            key.into(),
            CacheEntry {
                value,
                expires_at_ms,
            },
        );
    }

    pub fn remove(&self, key: &str) {
        rw_write(&self.entries.map, SOURCE, "remove").remove(key);
    }

    /// Clear every entry and stop the sweeper.
    ///
    /// This is a shutdown, not a reset: later writes are still served with
    /// lazy expiry but are no longer swept.
    pub fn flush_all(&self) {
        rw_write(&self.entries.map, SOURCE, "flush_all").clear();

        if let Some(handle) = mutex_lock(&self.sweeper, SOURCE, "flush_all").take() {
            handle.abort();
            debug!(target_module = SOURCE, "TTL store sweeper stopped");
        }
    }

    /// Run one sweep pass now, returning the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.entries.purge_expired()
    }

    /// Number of physically stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        rw_read(&self.entries.map, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the sweeper task is still running.
    pub fn is_sweeping(&self) -> bool {
        mutex_lock(&self.sweeper, SOURCE, "is_sweeping")
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<V> Drop for TtlStore<V> {
    fn drop(&mut self) {
        if let Some(handle) = mutex_lock(&self.sweeper, SOURCE, "drop").take() {
            handle.abort();
        }
    }
}

fn spawn_sweeper<V>(entries: Weak<Entries<V>>, period: Duration) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // Skip the first immediate tick

        loop {
            interval.tick().await;

            let Some(state) = entries.upgrade() else {
                break;
            };

            run_sweep_pass(|| state.purge_expired());
        }
    })
}

/// Run one sweep pass, recording what it removed.
///
/// A panicking pass is logged and reported as `None` so the sweeper keeps
/// ticking. Under `panic = "abort"` (the release profile) the process aborts
/// instead.
fn run_sweep_pass(pass: impl FnOnce() -> usize) -> Option<usize> {
    match catch_unwind(AssertUnwindSafe(pass)) {
        Ok(0) => Some(0),
        Ok(removed) => {
            counter!(METRIC_TTL_STORE_SWEPT).increment(removed as u64);
            debug!(
                target_module = SOURCE,
                removed, "Swept expired cache entries"
            );
            Some(removed)
        }
        Err(_) => {
            error!(
                target_module = SOURCE,
                "Cache sweep pass panicked; retrying on next tick"
            );
            None
        }
    }
}
