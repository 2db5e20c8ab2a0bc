// # multisource-core
//
// Core library for merging DNS endpoints from many independent sources.
//
// ## Architecture Overview
//
// This library provides the building blocks between record-producing
// backends and a downstream reconciler:
// - **Endpoint**: The DNS record every source produces
// - **Source**: Trait for producing endpoints and signalling changes
// - **MultiSource**: Bounded fan-out aggregator over any number of sources
// - **Target rewriting**: Optional override of every endpoint's targets
// - **SourceRegistry**: Plugin-based registry for source types
//
// ## Design Principles
//
// 1. **Best Effort**: A failing source never hides the endpoints of healthy ones
// 2. **Bounded**: At most a fixed number of sources are queried at once
// 3. **Plugin-Based**: Sources are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **No Policy**: Retry, backoff and "proceed with partial results?" belong
//    to sources and callers respectively

pub mod traits;
pub mod endpoint;
pub mod aggregator;
pub mod registry;
pub mod config;
pub mod error;
pub mod source;

// Re-export core types for convenience
pub use traits::{EventHandler, Source, SourceFactory};
pub use endpoint::{Endpoint, RecordType, Ttl};
pub use aggregator::{Collection, MultiSource};
pub use registry::SourceRegistry;
pub use config::{AggregatorConfig, ErrorPolicy, MultiSourceConfig, SourceConfig};
pub use error::{Error, Result, SourceFailure};
pub use source::{FileSource, MemorySource};
