//! Architectural Contract Test: Bounded Fan-Out
//!
//! This test enforces the concurrency limit of the aggregator.
//!
//! Constraints verified:
//! 1. No more than `concurrency` sources are queried at the same time
//! 2. The limit is actually used, sources are not serialised by accident
//! 3. Every source is queried exactly once per collection
//!
//! Time is paused so the in-flight counts are deterministic.
//!
//! If this test fails, a large source list can overwhelm its backends.

mod common;

use common::*;
use multisource_core::aggregator::MultiSource;
use multisource_core::config::DEFAULT_CONCURRENCY;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const HOLD: Duration = Duration::from_millis(50);

fn gauged_sources(count: usize, gauge: &Arc<ConcurrencyGauge>) -> Vec<Arc<dyn multisource_core::Source>> {
    (0..count)
        .map(|i| shared(GaugedSource::new(i, gauge, HOLD)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn default_limit_bounds_in_flight_sources() {
    let gauge = ConcurrencyGauge::new();
    let ms = MultiSource::new(gauged_sources(20, &gauge), Vec::new());

    let collection = ms.collect(&CancellationToken::new()).await;

    assert_eq!(collection.endpoints.len(), 20);
    assert_eq!(gauge.total(), 20, "Every source must be queried");
    assert_eq!(
        gauge.high_water(),
        DEFAULT_CONCURRENCY,
        "At most {} sources may be in flight, and the limit should be reached",
        DEFAULT_CONCURRENCY
    );
}

#[tokio::test(start_paused = true)]
async fn configured_limit_is_honoured() {
    let gauge = ConcurrencyGauge::new();
    let ms = MultiSource::new(gauged_sources(10, &gauge), Vec::new()).with_concurrency(3);

    let collection = ms.collect(&CancellationToken::new()).await;

    assert_eq!(collection.endpoints.len(), 10);
    assert_eq!(gauge.high_water(), 3);
}

#[tokio::test(start_paused = true)]
async fn limit_of_one_serialises_sources() {
    let gauge = ConcurrencyGauge::new();
    let ms = MultiSource::new(gauged_sources(5, &gauge), Vec::new()).with_concurrency(1);

    let started = Instant::now();
    let collection = ms.collect(&CancellationToken::new()).await;

    assert_eq!(collection.endpoints.len(), 5);
    assert_eq!(gauge.high_water(), 1);
    assert!(
        started.elapsed() >= HOLD * 5,
        "Serialised sources must run one after another"
    );
}

#[tokio::test(start_paused = true)]
async fn fewer_sources_than_limit_run_together() {
    let gauge = ConcurrencyGauge::new();
    let ms = MultiSource::new(gauged_sources(4, &gauge), Vec::new());

    let started = Instant::now();
    ms.collect(&CancellationToken::new()).await;

    assert_eq!(gauge.high_water(), 4);
    assert!(started.elapsed() < HOLD * 2, "Independent sources must overlap");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_source_is_queried_exactly_once() {
    let sources: Vec<StaticSource> = (0..30)
        .map(|i| {
            StaticSource::new(
                &format!("s{}", i),
                vec![endpoint(&format!("s{}.example.com", i), &["192.0.2.1"])],
            )
        })
        .collect();
    let probes: Vec<StaticSource> = sources.iter().map(StaticSource::sharing_counters_with).collect();

    let ms = MultiSource::new(sources.into_iter().map(shared).collect(), Vec::new());
    let collection = ms.collect(&CancellationToken::new()).await;

    assert_eq!(collection.endpoints.len(), 30);
    for probe in &probes {
        assert_eq!(probe.call_count(), 1);
    }
}
