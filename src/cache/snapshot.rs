//! Single-slot snapshot cache with a per-request overlay.
//!
//! The slot holds one shared snapshot for one discriminator value. Overlay
//! fields are computed on every call and applied to a copy of the snapshot;
//! they are never stored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::Mutex;
use tracing::debug;

use super::clock::{Clock, duration_millis};

const METRIC_SNAPSHOT_HIT: &str = "freshgate_snapshot_hit_total";
const METRIC_SNAPSHOT_MISS: &str = "freshgate_snapshot_miss_total";

/// Snapshot types that accept request-specific fields.
pub trait Overlay {
    type Fields;

    fn apply_overlay(&mut self, fields: Self::Fields);
}

struct Slot<D, S> {
    state: S,
    discriminator: D,
    cached_at_ms: i64,
}

pub struct SnapshotCache<D, S> {
    slot: Mutex<Option<Slot<D, S>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<D, S> SnapshotCache<D, S>
where
    D: PartialEq + std::fmt::Debug,
    S: Overlay + Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
            clock,
        }
    }

    /// Returns the shared snapshot for `discriminator` with the overlay applied.
    ///
    /// The slot lock is held from the freshness check until the recomputed
    /// snapshot is stored, so concurrent misses run `recompute` once. A failed
    /// or cancelled recompute leaves the slot untouched.
    pub async fn get_or_compute<E, R, Fut, O>(
        &self,
        discriminator: D,
        recompute: R,
        overlay: O,
    ) -> Result<S, E>
    where
        R: FnOnce() -> Fut,
        Fut: Future<Output = Result<S, E>>,
        O: FnOnce() -> S::Fields,
    {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now_millis();
        let ttl_ms = duration_millis(self.ttl);

        let cached = slot.as_ref().filter(|cached| {
            cached.discriminator == discriminator && now - cached.cached_at_ms < ttl_ms
        });

        let mut state = match cached {
            Some(cached) => {
                counter!(METRIC_SNAPSHOT_HIT).increment(1);
                debug!(discriminator = ?discriminator, "Snapshot served from cache");
                cached.state.clone()
            }
            None => {
                counter!(METRIC_SNAPSHOT_MISS).increment(1);
                let state = recompute().await?;
                *slot = Some(Slot {
                    state: state.clone(),
                    discriminator,
                    cached_at_ms: self.clock.now_millis(),
                });
                state
            }
        };
        drop(slot);

        state.apply_overlay(overlay());
        Ok(state)
    }

    /// Drop the cached snapshot.
    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn is_cached(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
