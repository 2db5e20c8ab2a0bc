//! Test doubles and common utilities for aggregator contract tests
//!
//! This module provides minimal sources that let the tests observe how the
//! aggregator calls them, without any real backend.

#![allow(dead_code)]

use multisource_core::endpoint::{Endpoint, RecordType, Ttl};
use multisource_core::error::{Error, Result};
use multisource_core::traits::{EventHandler, Source};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Share a source the way the aggregator expects
pub fn shared<S: Source + 'static>(source: S) -> Arc<dyn Source> {
    Arc::new(source)
}

/// Build an A/CNAME endpoint with a TTL
pub fn endpoint(name: &str, targets: &[&str]) -> Endpoint {
    let record_type = match targets.first() {
        Some(t) if t.parse::<std::net::IpAddr>().is_err() => RecordType::Cname,
        _ => RecordType::A,
    };
    Endpoint::with_ttl(name, record_type, Ttl(300), targets.iter().copied())
}

/// Sort endpoints into a canonical order for set comparisons
pub fn sorted(mut endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    endpoints.sort_by_key(|ep| ep.to_string());
    endpoints
}

/// A source returning fixed endpoints, optionally after a delay
pub struct StaticSource {
    name: String,
    endpoints: Vec<Endpoint>,
    delay: Duration,
    /// Call counter for endpoints()
    call_count: Arc<AtomicUsize>,
    /// Registered handlers
    handlers: Arc<Mutex<Vec<EventHandler>>>,
    /// Whether the shared token was cancelled when the call finished
    saw_cancel: Arc<AtomicBool>,
}

impl StaticSource {
    pub fn new(name: &str, endpoints: Vec<Endpoint>) -> Self {
        Self {
            name: name.to_string(),
            endpoints,
            delay: Duration::ZERO,
            call_count: Arc::new(AtomicUsize::new(0)),
            handlers: Arc::new(Mutex::new(Vec::new())),
            saw_cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wait `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Create a new StaticSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            name: other.name.clone(),
            endpoints: other.endpoints.clone(),
            delay: other.delay,
            call_count: Arc::clone(&other.call_count),
            handlers: Arc::clone(&other.handlers),
            saw_cancel: Arc::clone(&other.saw_cancel),
        }
    }

    /// Get the number of times endpoints() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times add_event_handler() was called
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    /// Whether the token was cancelled when endpoints() returned
    pub fn saw_cancel(&self) -> bool {
        self.saw_cancel.load(Ordering::SeqCst)
    }

    /// Invoke every registered handler once
    pub fn fire(&self) {
        let handlers = self.handlers.lock().unwrap().clone();
        for handler in handlers {
            handler();
        }
    }
}

#[async_trait::async_trait]
impl Source for StaticSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.saw_cancel.store(cancel.is_cancelled(), Ordering::SeqCst);
        Ok(self.endpoints.clone())
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, handler: EventHandler) {
        self.handlers.lock().unwrap().push(handler);
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// A source that always fails, optionally after a delay
pub struct FailingSource {
    name: String,
    delay: Duration,
}

impl FailingSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl Source for FailingSource {
    async fn endpoints(&self, _cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Err(Error::source_failed(&self.name, "backend unavailable"))
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, _handler: EventHandler) {}

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Tracks how many calls are in flight and the highest value observed
#[derive(Default)]
pub struct ConcurrencyGauge {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    total: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Highest number of simultaneous calls observed
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// Total number of calls observed
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// A source that holds its call open for a while and reports to a gauge
pub struct GaugedSource {
    name: String,
    gauge: Arc<ConcurrencyGauge>,
    hold: Duration,
}

impl GaugedSource {
    pub fn new(index: usize, gauge: &Arc<ConcurrencyGauge>, hold: Duration) -> Self {
        Self {
            name: format!("gauged-{}", index),
            gauge: Arc::clone(gauge),
            hold,
        }
    }
}

#[async_trait::async_trait]
impl Source for GaugedSource {
    async fn endpoints(&self, _cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        self.gauge.enter();
        tokio::time::sleep(self.hold).await;
        self.gauge.exit();
        Ok(vec![endpoint(&format!("{}.example.com", self.name), &["192.0.2.1"])])
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, _handler: EventHandler) {}

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// A source that blocks until the caller cancels the token
pub struct CancellableSource {
    name: String,
}

impl CancellableSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Source for CancellableSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        cancel.cancelled().await;
        Err(Error::cancelled(format!("{} stopped", self.name)))
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, _handler: EventHandler) {}

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// A source whose endpoints() panics
pub struct PanickingSource;

#[async_trait::async_trait]
impl Source for PanickingSource {
    async fn endpoints(&self, _cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        panic!("source blew up");
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, _handler: EventHandler) {}

    fn source_name(&self) -> &str {
        "panicking"
    }
}
