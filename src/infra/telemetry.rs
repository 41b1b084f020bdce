use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "freshgate_ttl_store_hit_total",
            Unit::Count,
            "Total number of TTL store reads that found a live entry."
        );
        describe_counter!(
            "freshgate_ttl_store_miss_total",
            Unit::Count,
            "Total number of TTL store reads that found no live entry."
        );
        describe_counter!(
            "freshgate_ttl_store_swept_total",
            Unit::Count,
            "Total number of expired TTL store entries removed by the sweeper."
        );
        describe_counter!(
            "freshgate_results_cache_hit_total",
            Unit::Count,
            "Total number of query results served from the results cache."
        );
        describe_counter!(
            "freshgate_results_cache_miss_total",
            Unit::Count,
            "Total number of results cache lookups with no fresh result."
        );
        describe_counter!(
            "freshgate_snapshot_hit_total",
            Unit::Count,
            "Total number of snapshot reads served from the cached slot."
        );
        describe_counter!(
            "freshgate_snapshot_miss_total",
            Unit::Count,
            "Total number of snapshot reads that triggered a recompute."
        );
    });
}
