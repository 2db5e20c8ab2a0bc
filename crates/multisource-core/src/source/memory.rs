// # Memory Source
//
// In-memory implementation of Source.
//
// ## Purpose
//
// Serves a list of endpoints held by the process. The list can be replaced
// at any time; replacing it notifies every registered handler.
//
// ## When to Use
//
// - Testing environments
// - Embedding applications that compute records themselves
// - Fixed records declared inline in configuration

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::config::SourceConfig;
use crate::endpoint::Endpoint;
use crate::traits::{EventHandler, Source, SourceFactory};

/// In-memory endpoint source
///
/// # Example
///
/// ```rust
/// use multisource_core::endpoint::{Endpoint, RecordType};
/// use multisource_core::source::MemorySource;
/// use multisource_core::traits::Source;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = MemorySource::new(Vec::new());
///
///     source
///         .set_endpoints(vec![Endpoint::new("a.example.com", RecordType::A, ["192.0.2.1"])])
///         .await;
///
///     let endpoints = source.endpoints(&CancellationToken::new()).await?;
///     assert_eq!(endpoints.len(), 1);
///
///     Ok(())
/// }
/// ```
pub struct MemorySource {
    name: String,
    endpoints: RwLock<Vec<Endpoint>>,
    handlers: Mutex<Vec<(CancellationToken, EventHandler)>>,
}

impl MemorySource {
    /// Create a memory source named "memory"
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self::named("memory", endpoints)
    }

    /// Create a memory source with a custom name
    pub fn named(name: impl Into<String>, endpoints: Vec<Endpoint>) -> Self {
        Self {
            name: name.into(),
            endpoints: RwLock::new(endpoints),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Replace the served endpoints and notify handlers
    pub async fn set_endpoints(&self, endpoints: Vec<Endpoint>) {
        *self.endpoints.write().await = endpoints;
        self.notify();
    }

    /// Get the number of endpoints currently served
    pub async fn len(&self) -> usize {
        self.endpoints.read().await.len()
    }

    /// Check if no endpoints are served
    pub async fn is_empty(&self) -> bool {
        self.endpoints.read().await.is_empty()
    }

    /// Number of handlers whose token has not been cancelled
    pub fn handler_count(&self) -> usize {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers.retain(|(cancel, _)| !cancel.is_cancelled());
        handlers.len()
    }

    fn notify(&self) {
        // Handlers run outside the lock so they may call back into the source
        let active: Vec<EventHandler> = {
            let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
            handlers.retain(|(cancel, _)| !cancel.is_cancelled());
            handlers.iter().map(|(_, handler)| Arc::clone(handler)).collect()
        };

        tracing::debug!("Source {} notifying {} handler(s)", self.name, active.len());
        for handler in active {
            handler();
        }
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, Error> {
        if cancel.is_cancelled() {
            return Err(Error::cancelled(format!("Source {} was cancelled", self.name)));
        }
        Ok(self.endpoints.read().await.clone())
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        if cancel.is_cancelled() {
            return;
        }
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((cancel.clone(), handler));
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Factory for creating memory sources
pub struct MemorySourceFactory;

impl SourceFactory for MemorySourceFactory {
    fn create(&self, config: &SourceConfig) -> Result<Arc<dyn Source>, Error> {
        match config {
            SourceConfig::Memory { name, endpoints } => {
                let name = name.clone().unwrap_or_else(|| "memory".to_string());
                Ok(Arc::new(MemorySource::named(name, endpoints.clone())))
            }
            _ => Err(Error::config("Invalid config for memory source")),
        }
    }
}
