// # Source Trait
//
// Defines the interface every endpoint producer implements.
//
// ## Implementations
//
// - In-memory: `MemorySource` (this crate)
// - JSON file: `FileSource` (this crate)
// - HTTP: `multisource-http` crate
// - Aggregate: `MultiSource` (this crate) merges any number of the above
//
// ## Usage
//
// ```rust,ignore
// use multisource_core::Source;
// use tokio_util::sync::CancellationToken;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* Source implementation */;
//     let cancel = CancellationToken::new();
//
//     let endpoints = source.endpoints(&cancel).await?;
//     source.add_event_handler(&cancel, std::sync::Arc::new(|| println!("changed")));
//
//     Ok(())
// }
// ```

use crate::endpoint::Endpoint;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Callback invoked by a source when its endpoints may have changed
///
/// Handlers carry no payload; the receiver is expected to collect again.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Trait for endpoint sources
///
/// A source has exactly two capabilities: produce its current endpoints,
/// and register a change-notification callback.
///
/// # Thread Safety
///
/// Implementations must be thread-safe. The aggregator shares each source
/// behind an `Arc` and calls it from spawned tasks.
///
/// # Responsibilities
///
/// ## Owned by the source
/// - ✅ Talking to its backend (files, HTTP APIs, in-process state)
/// - ✅ Honouring the cancellation token if it wants to stop early
/// - ✅ Deciding whether and how to retry a failing backend
///
/// ## Owned by the aggregator
/// - ❌ Merging results from several sources
/// - ❌ Bounding how many sources are queried at once
/// - ❌ Rewriting targets to an override list
///
/// A source must not assume anything about its siblings: when one source
/// fails, the others keep running and their endpoints are still returned.
#[async_trait]
pub trait Source: Send + Sync {
    /// Produce the source's current endpoints
    ///
    /// # Parameters
    ///
    /// - `cancel`: Token shared with every other source in the same
    ///   collection. Cancelled only by the caller, never by the aggregator.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Endpoint>)`: The endpoints, in whatever order the source chooses
    /// - `Err(Error)`: If the backend could not be read
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, crate::Error>;

    /// Register a change-notification callback
    ///
    /// The source may invoke `handler` any number of times, from any task,
    /// until `cancel` fires.
    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler);

    /// Get the source name (for logging and failure attribution)
    fn source_name(&self) -> &str;
}

/// Helper trait for constructing sources from configuration
///
/// Factories must not perform I/O: building a source is pure, the backend
/// is first touched when endpoints are requested.
pub trait SourceFactory: Send + Sync {
    /// Create a Source instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this source type
    ///
    /// # Returns
    ///
    /// A shared Source trait object
    fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Arc<dyn Source>, crate::Error>;
}
