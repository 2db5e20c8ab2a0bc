// # HTTP Endpoint Source
//
// This crate provides an HTTP-based endpoint source for the multisource
// aggregator.
//
// ## Purpose
//
// Pulls records published by another service (an inventory API, a service
// catalogue, a static bucket) so they can be merged with local sources.
//
// ## Architecture
//
// Every `endpoints()` call issues one GET and expects a JSON array of
// endpoints, or an object with an `endpoints` array. There is no caching:
// the aggregator asks once per collection and a stale answer would defeat
// the point.
//
// Change notification polls the same URL at a configurable interval and
// fires the handler when the returned list differs from the previous one.

use multisource_core::SourceRegistry;
use multisource_core::config::SourceConfig;
use multisource_core::endpoint::Endpoint;
use multisource_core::source::spawn_change_poller;
use multisource_core::traits::{EventHandler, Source, SourceFactory};
use multisource_core::{Error, Result};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Default polling interval for change notifications
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Per-request timeout
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum EndpointDocument {
    Bare(Vec<Endpoint>),
    Wrapped { endpoints: Vec<Endpoint> },
}

impl EndpointDocument {
    fn into_endpoints(self) -> Vec<Endpoint> {
        match self {
            EndpointDocument::Bare(endpoints) | EndpointDocument::Wrapped { endpoints } => endpoints,
        }
    }
}

/// HTTP-backed endpoint source
pub struct HttpSource {
    /// URL to fetch endpoints from
    url: String,

    /// Name used in logs and failure reports
    name: String,

    /// Polling interval for change notifications
    poll_interval: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a new HTTP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL returning the endpoint list as JSON
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_interval(url, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Create with custom polling interval
    pub fn with_interval(url: impl Into<String>, poll_interval: Duration) -> Self {
        let url = url.into();
        Self {
            name: format!("http:{}", url),
            url,
            poll_interval,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// The URL this source fetches
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The change-notification polling interval
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Fetch and decode the endpoint list
async fn fetch_endpoints(client: &reqwest::Client, url: &str, name: &str) -> Result<Vec<Endpoint>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::source_failed(name, format!("Request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::http(format!("{} returned {}", url, status)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::source_failed(name, format!("Failed to read response: {}", e)))?;

    let document: EndpointDocument = serde_json::from_str(&body)
        .map_err(|e| Error::invalid_input(format!("Invalid endpoint list from {}: {}", url, e)))?;

    let endpoints = document.into_endpoints();
    tracing::debug!("Fetched {} endpoint(s) from {}", endpoints.len(), url);
    Ok(endpoints)
}

#[async_trait::async_trait]
impl Source for HttpSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled(format!("Request to {} was cancelled", self.url))),
            fetched = fetch_endpoints(&self.client, &self.url, &self.name) => fetched,
        }
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        tracing::info!(
            "Starting HTTP endpoint monitoring (url={}, interval={:?})",
            self.url,
            self.poll_interval
        );

        let client = self.client.clone();
        let url = self.url.clone();
        let name = self.name.clone();

        spawn_change_poller(&*self.name, self.poll_interval, cancel.clone(), handler, move || {
            let client = client.clone();
            let url = url.clone();
            let name = name.clone();
            async move { fetch_endpoints(&client, &url, &name).await }
        });
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Factory for creating HTTP sources
pub struct HttpSourceFactory;

impl SourceFactory for HttpSourceFactory {
    fn create(&self, config: &SourceConfig) -> Result<Arc<dyn Source>> {
        match config {
            SourceConfig::Http { url, interval_secs } => Ok(Arc::new(HttpSource::with_interval(
                url.clone(),
                Duration::from_secs(*interval_secs),
            ))),
            _ => Err(Error::config("Invalid config for HTTP source")),
        }
    }
}

/// Register the HTTP source with a registry
pub fn register(registry: &SourceRegistry) {
    registry.register_source("http", Box::new(HttpSourceFactory));
}
