//! Results cache lookups through the freshness gate.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use freshgate::application::results_cache::ResultsCacheService;
use freshgate::cache::{FreshnessGate, ManualClock};
use freshgate::domain::query_history::FreshnessCandidate;
use freshgate::infra::memory::InMemoryQueryHistory;
use serde_json::json;
use uuid::Uuid;

const NOW: i64 = 1_700_000_000_000;

fn written(cache_key: &str, expires_in_ms: i64) -> FreshnessCandidate {
    FreshnessCandidate {
        cache_key: cache_key.to_string(),
        results_file_name: Some(format!("{cache_key}.jsonl")),
        columns: Some(BTreeMap::from([(
            "orders_total".to_string(),
            json!({"type": "number", "label": "Total"}),
        )])),
        total_row_count: Some(42),
        results_created_at_ms: Some(NOW - 60_000),
        results_updated_at_ms: Some(NOW - 60_000),
        results_expires_at_ms: Some(NOW + expires_in_ms),
        ..Default::default()
    }
}

struct Fixture {
    service: ResultsCacheService,
    history: Arc<InMemoryQueryHistory>,
    clock: Arc<ManualClock>,
    project: Uuid,
}

fn fixture(enabled: bool, stale_window: Duration) -> Fixture {
    let history = Arc::new(InMemoryQueryHistory::new());
    let clock = Arc::new(ManualClock::new(NOW));
    let service = ResultsCacheService::new(
        history.clone(),
        FreshnessGate::new(enabled, stale_window),
        clock.clone(),
    );
    Fixture {
        service,
        history,
        clock,
        project: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn fresh_result_is_served() {
    let fx = fixture(true, Duration::from_secs(3_600));
    fx.history.insert(fx.project, written("abc", 30 * 60 * 1000));

    let hit = fx
        .service
        .find_cached_results(fx.project, "abc")
        .await
        .expect("lookup")
        .expect("hit");

    assert!(hit.cache_hit);
    assert_eq!(hit.file_name, "abc.jsonl");
    assert_eq!(hit.total_row_count, 42);
    assert_eq!(hit.columns["orders_total"]["label"], json!("Total"));
}

#[tokio::test]
async fn result_inside_expiry_buffer_is_a_miss() {
    let fx = fixture(true, Duration::from_secs(3_600));
    fx.history.insert(fx.project, written("abc", 5 * 60 * 1000));

    let hit = fx
        .service
        .find_cached_results(fx.project, "abc")
        .await
        .expect("lookup");

    assert!(hit.is_none());
}

#[tokio::test]
async fn result_turns_stale_as_time_passes() {
    let fx = fixture(true, Duration::from_secs(600));
    fx.history.insert(fx.project, written("abc", 200_000));

    let before = fx
        .service
        .find_cached_results(fx.project, "abc")
        .await
        .expect("lookup");
    fx.clock.advance(Duration::from_millis(50_000));
    let after = fx
        .service
        .find_cached_results(fx.project, "abc")
        .await
        .expect("lookup");

    assert!(before.is_some());
    assert!(after.is_none());
}

#[tokio::test]
async fn disabled_cache_never_reaches_the_repository() {
    let fx = fixture(false, Duration::from_secs(3_600));
    fx.history
        .insert(fx.project, written("abc", 365 * 24 * 60 * 60 * 1000));

    let hit = fx
        .service
        .find_cached_results(fx.project, "abc")
        .await
        .expect("lookup");

    assert!(hit.is_none());
    assert_eq!(fx.history.lookups(), 0);
}

#[tokio::test]
async fn partially_written_record_is_a_miss() {
    let fx = fixture(true, Duration::from_secs(3_600));
    let mut record = written("abc", 60 * 60 * 1000);
    record.columns = None;
    fx.history.insert(fx.project, record);

    let hit = fx
        .service
        .find_cached_results(fx.project, "abc")
        .await
        .expect("lookup");

    assert!(hit.is_none());
    assert_eq!(fx.history.lookups(), 1);
}

#[tokio::test]
async fn unknown_key_or_project_is_a_miss() {
    let fx = fixture(true, Duration::from_secs(3_600));
    fx.history.insert(fx.project, written("abc", 60 * 60 * 1000));

    let other_key = fx
        .service
        .find_cached_results(fx.project, "def")
        .await
        .expect("lookup");
    let other_project = fx
        .service
        .find_cached_results(Uuid::new_v4(), "abc")
        .await
        .expect("lookup");

    assert!(other_key.is_none());
    assert!(other_project.is_none());
}
