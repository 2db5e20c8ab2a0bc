//! Change detection by polling
//!
//! Sources whose backend cannot push notifications poll a cheap probe
//! (a file's modification time, a fetched record list) and fire their
//! event handler whenever the probed value changes, or the probe starts or
//! stops failing (a watched file appearing or disappearing).

use crate::error::Result;
use crate::traits::EventHandler;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Last outcome of a probe
#[derive(Debug, PartialEq)]
enum Observation<T> {
    Value(T),
    Failed,
}

/// Spawn a task that calls `handler` whenever the probe outcome changes
///
/// The first probe, successful or not, is the baseline and does not fire
/// the handler. Later probes fire it when the value differs from the last
/// one, or when the probe switches between failing and succeeding.
/// Consecutive failures fire nothing. The task exits as soon as `cancel`
/// fires.
///
/// Returns `None` (and spawns nothing) when called outside a tokio runtime
/// or with a zero interval.
pub fn spawn_change_poller<T, F, Fut>(
    source_name: impl Into<String>,
    interval: Duration,
    cancel: CancellationToken,
    handler: EventHandler,
    probe: F,
) -> Option<JoinHandle<()>>
where
    T: PartialEq + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let source_name = source_name.into();

    if interval.is_zero() {
        warn!("Source {} has a zero watch interval, not watching", source_name);
        return None;
    }

    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            warn!(
                "Source {} cannot watch for changes outside a tokio runtime",
                source_name
            );
            return None;
        }
    };

    Some(runtime.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!("Watching source {} every {:?}", source_name, interval);

        let mut last_seen: Option<Observation<T>> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Stopped watching source {}", source_name);
                    break;
                }
                _ = ticker.tick() => {
                    let current = match probe().await {
                        Ok(value) => Observation::Value(value),
                        Err(e) => {
                            warn!("Probe for source {} failed: {}", source_name, e);
                            Observation::Failed
                        }
                    };

                    if last_seen.as_ref().is_some_and(|previous| *previous != current) {
                        debug!("Source {} changed", source_name);
                        handler();
                    }
                    last_seen = Some(current);
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_fires_only_on_change() {
        let probes = Arc::new(AtomicUsize::new(0));
        let fired = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let probe_count = Arc::clone(&probes);
        let fired_count = Arc::clone(&fired);
        let task = spawn_change_poller(
            "test",
            Duration::from_secs(1),
            cancel.clone(),
            Arc::new(move || {
                fired_count.fetch_add(1, Ordering::SeqCst);
            }),
            move || {
                // 0, 0, 1, 1, 2, ...
                let n = probe_count.fetch_add(1, Ordering::SeqCst) / 2;
                async move { Ok(n) }
            },
        )
        .expect("inside a runtime");

        tokio::time::sleep(Duration::from_millis(4500)).await;
        cancel.cancel();
        task.await.unwrap();

        // Probes at t=0..=4 see 0,0,1,1,2: two changes after the baseline
        assert_eq!(probes.load(Ordering::SeqCst), 5);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    /// Run a poller over `outcomes` (one per second, last one repeats)
    /// and return how often the handler fired
    async fn fired_for(outcomes: Vec<std::result::Result<u32, ()>>) -> usize {
        let fired = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let steps = outcomes.len();
        let outcomes = Arc::new(outcomes);

        let fired_count = Arc::clone(&fired);
        let task = spawn_change_poller(
            "test",
            Duration::from_secs(1),
            cancel.clone(),
            Arc::new(move || {
                fired_count.fetch_add(1, Ordering::SeqCst);
            }),
            move || {
                let i = calls.fetch_add(1, Ordering::SeqCst);
                let outcome = outcomes[i.min(outcomes.len() - 1)];
                async move { outcome.map_err(|_| crate::Error::other("unavailable")) }
            },
        )
        .expect("inside a runtime");

        tokio::time::sleep(Duration::from_millis(steps as u64 * 1000 - 500)).await;
        cancel.cancel();
        task.await.unwrap();

        fired.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_when_probe_starts_succeeding() {
        // A watched file created after startup
        assert_eq!(fired_for(vec![Err(()), Err(()), Ok(1), Ok(1), Ok(1)]).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_when_probe_starts_failing() {
        // A watched file deleted while watched
        assert_eq!(fired_for(vec![Ok(1), Ok(1), Err(()), Err(()), Err(())]).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_on_every_transition() {
        assert_eq!(fired_for(vec![Ok(1), Err(()), Ok(1), Ok(2), Err(())]).await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_baseline_does_not_fire() {
        assert_eq!(fired_for(vec![Err(()), Err(()), Err(())]).await, 0);
    }

    #[tokio::test]
    async fn test_exits_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let task = spawn_change_poller(
            "test",
            Duration::from_secs(3600),
            cancel,
            Arc::new(|| {}),
            || async { Ok(()) },
        )
        .expect("inside a runtime");

        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_spawns_nothing() {
        let task = spawn_change_poller(
            "test",
            Duration::ZERO,
            CancellationToken::new(),
            Arc::new(|| {}),
            || async { Ok(0u8) },
        );
        assert!(task.is_none());
    }

    #[test]
    fn test_outside_runtime_spawns_nothing() {
        let task = spawn_change_poller(
            "test",
            Duration::from_secs(1),
            CancellationToken::new(),
            Arc::new(|| {}),
            || async { Ok(0u8) },
        );
        assert!(task.is_none());
    }
}
