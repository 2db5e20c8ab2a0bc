//! Endpoint aggregation across many sources
//!
//! [`MultiSource`] is responsible for:
//! - Querying every child source concurrently, at most `concurrency` at a time
//! - Rewriting endpoints to the override targets, when configured
//! - Merging all results into one list
//! - Reporting failing sources without aborting healthy ones
//!
//! ## Architecture
//!
//! ```text
//!                      collect(cancel)
//!                            │
//!          ┌─────────────────┼─────────────────┐
//!          ▼                 ▼                 ▼
//!   ┌────────────┐    ┌────────────┐    ┌────────────┐
//!   │ worker #1  │    │ worker #2  │    │ worker #N  │   one task per source
//!   └────────────┘    └────────────┘    └────────────┘
//!          │ acquire permit (Semaphore, `concurrency` slots)
//!          │ source.endpoints(cancel)
//!          │ release permit
//!          │ rewrite targets (optional)
//!          ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ Mutex<Collection>  endpoints + failures      │   locked only to merge
//!   └──────────────────────────────────────────────┘
//!                            │
//!                  join every worker (barrier)
//!                            ▼
//!                       Collection
//! ```
//!
//! ## Failure Semantics
//!
//! 1. A failing source contributes no endpoints
//! 2. Its siblings keep running; the shared token is never cancelled here
//! 3. Every failure is recorded (or only the last one, under
//!    [`ErrorPolicy::LastWins`])
//! 4. `collect()` returns only once every worker has finished

pub mod rewrite;

pub use rewrite::{rewrite_all, rewrite_targets};

use crate::config::{ErrorPolicy, MultiSourceConfig, DEFAULT_CONCURRENCY};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result, SourceFailure};
use crate::traits::{EventHandler, Source};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one collection across all sources
///
/// `endpoints` is the concatenation of every successful source's endpoints,
/// in the order the workers finished. A non-empty `failures` means the list
/// is a best-effort union, not that it is empty or invalid.
#[derive(Debug, Default)]
pub struct Collection {
    /// Endpoints from every source that succeeded
    pub endpoints: Vec<Endpoint>,
    /// Failures, attributed to their sources
    pub failures: Vec<SourceFailure>,
}

impl Collection {
    /// Whether every source succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Split into the endpoints and at most one error describing all failures
    pub fn into_parts(self) -> (Vec<Endpoint>, Option<Error>) {
        let error = if self.failures.is_empty() {
            None
        } else {
            Some(Error::Collection {
                failures: self.failures,
            })
        };
        (self.endpoints, error)
    }

    /// Convert into a `Result`, keeping partial endpoints inside the error
    pub fn into_result(self) -> Result<Vec<Endpoint>> {
        if self.failures.is_empty() {
            Ok(self.endpoints)
        } else {
            Err(Error::Partial {
                endpoints: self.endpoints,
                failures: self.failures,
            })
        }
    }

    fn merge(&mut self, source_name: &str, outcome: Result<Vec<Endpoint>>, policy: ErrorPolicy) {
        match outcome {
            Ok(mut endpoints) => self.endpoints.append(&mut endpoints),
            Err(error) => self.record_failure(SourceFailure::new(source_name, error), policy),
        }
    }

    fn record_failure(&mut self, failure: SourceFailure, policy: ErrorPolicy) {
        if policy == ErrorPolicy::LastWins {
            self.failures.clear();
        }
        self.failures.push(failure);
    }
}

/// A source that merges the endpoints of its child sources
///
/// ## Lifecycle
///
/// 1. Build with [`MultiSource::new()`] or [`MultiSource::from_config()`]
/// 2. Call [`MultiSource::collect()`] as often as needed; each call starts
///    from scratch and hands the caller a fresh [`Collection`]
///
/// Construction performs no I/O. Child order only affects construction;
/// result order depends on which workers finish first.
pub struct MultiSource {
    /// Child sources
    children: Vec<Arc<dyn Source>>,

    /// Override targets (empty = no rewrite)
    default_targets: Arc<[String]>,

    /// Maximum number of children queried at once
    concurrency: usize,

    /// Failure reporting policy
    error_policy: ErrorPolicy,
}

impl MultiSource {
    /// Create an aggregator with the default limits
    ///
    /// # Parameters
    ///
    /// - `children`: Sources to aggregate
    /// - `default_targets`: Override targets; empty disables rewriting
    pub fn new(children: Vec<Arc<dyn Source>>, default_targets: Vec<String>) -> Self {
        Self {
            children,
            default_targets: default_targets.into(),
            concurrency: DEFAULT_CONCURRENCY,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Create an aggregator from configuration
    ///
    /// `children` are expected to have been built from `config.sources`,
    /// usually through [`crate::SourceRegistry::create_sources()`].
    pub fn from_config(children: Vec<Arc<dyn Source>>, config: &MultiSourceConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::new(children, config.default_targets.clone())
            .with_concurrency(config.aggregator.concurrency)
            .with_error_policy(config.aggregator.error_policy))
    }

    /// Set the maximum number of sources queried at once (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the failure reporting policy
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Number of child sources
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no child sources
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The configured concurrency limit
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The configured override targets
    pub fn default_targets(&self) -> &[String] {
        &self.default_targets
    }

    /// Collect endpoints from every child source
    ///
    /// Spawns one worker per child. Each worker waits for a concurrency
    /// slot, queries its source with a clone of `cancel`, gives the slot
    /// back and merges its result under the collection lock. The lock is
    /// never held while a source is being queried.
    ///
    /// # Returns
    ///
    /// The merged [`Collection`], once every worker has finished. A worker
    /// that panics is reported as a failure of its source.
    pub async fn collect(&self, cancel: &CancellationToken) -> Collection {
        let collection = Arc::new(Mutex::new(Collection::default()));
        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let policy = self.error_policy;

        let mut workers = JoinSet::new();
        let mut worker_sources = HashMap::with_capacity(self.children.len());

        for child in &self.children {
            let child = Arc::clone(child);
            let cancel = cancel.clone();
            let limiter = Arc::clone(&limiter);
            let collection = Arc::clone(&collection);
            let default_targets = Arc::clone(&self.default_targets);
            let source_name = child.source_name().to_string();

            let handle = workers.spawn(async move {
                let outcome = match limiter.acquire().await {
                    Ok(_permit) => child.endpoints(&cancel).await,
                    Err(e) => Err(Error::worker(format!("Concurrency limiter closed: {}", e))),
                };

                let outcome = outcome.map(|endpoints| {
                    if default_targets.is_empty() {
                        endpoints
                    } else {
                        rewrite_all(&endpoints, &default_targets)
                    }
                });

                match &outcome {
                    Ok(endpoints) => {
                        debug!("Source {} produced {} endpoint(s)", child.source_name(), endpoints.len())
                    }
                    Err(e) => warn!("Source {} failed: {}", child.source_name(), e),
                }

                collection
                    .lock()
                    .await
                    .merge(child.source_name(), outcome, policy);
            });

            worker_sources.insert(handle.id(), source_name);
        }

        // Barrier: no early exit, even after a failure
        while let Some(joined) = workers.join_next_with_id().await {
            if let Err(e) = joined {
                let source_name = worker_sources
                    .remove(&e.id())
                    .unwrap_or_else(|| "unknown".to_string());
                warn!("Worker for source {} did not complete: {}", source_name, e);

                collection.lock().await.record_failure(
                    SourceFailure::new(source_name, Error::worker(e.to_string())),
                    policy,
                );
            }
        }

        let collection = std::mem::take(&mut *collection.lock().await);
        info!(
            "Collected {} endpoint(s) from {} source(s), {} failure(s)",
            collection.endpoints.len(),
            self.children.len(),
            collection.failures.len()
        );

        collection
    }
}

#[async_trait]
impl Source for MultiSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        self.collect(cancel).await.into_result()
    }

    /// Forward the handler to every child; notifications are not deduplicated
    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        for child in &self.children {
            child.add_event_handler(cancel, Arc::clone(&handler));
        }
    }

    fn source_name(&self) -> &str {
        "multi"
    }
}
