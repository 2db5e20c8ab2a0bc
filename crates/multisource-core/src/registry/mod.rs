//! Plugin-based source registry
//!
//! The registry allows source types to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use multisource_core::registry::SourceRegistry;
//! use multisource_core::config::SourceConfig;
//!
//! // Built-in memory and file sources are pre-registered
//! let registry = SourceRegistry::with_builtin();
//!
//! // Register additional source types
//! multisource_http::register(&registry);
//!
//! // Create sources from config
//! let sources = registry.create_sources(&config.sources)?;
//! ```
//!
//! ## Registration
//!
//! Source crates should expose a registration function:
//!
//! ```rust,ignore
//! pub fn register(registry: &SourceRegistry) {
//!     registry.register_source("http", Box::new(HttpSourceFactory));
//! }
//! ```

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::source::{FileSourceFactory, MemorySourceFactory};
use crate::traits::{Source, SourceFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry for plugin-based source creation
///
/// The registry maintains a map of source type names to factory objects,
/// allowing dynamic instantiation of sources based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct SourceRegistry {
    /// Registered source factories
    sources: RwLock<HashMap<String, Box<dyn SourceFactory>>>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `memory` and `file` sources
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_source("memory", Box::new(MemorySourceFactory));
        registry.register_source("file", Box::new(FileSourceFactory));
        registry
    }

    /// Register a source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "file", "http")
    /// - `factory`: Factory object for creating source instances
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn SourceFactory>) {
        let name = name.into();
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.insert(name, factory);
    }

    /// Create a source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn Source>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &SourceConfig) -> Result<Arc<dyn Source>> {
        let source_type = config.type_name();
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown source type: {}", source_type)))?;

        factory.create(config)
    }

    /// Create every configured source, in order
    ///
    /// Fails on the first source that cannot be created.
    pub fn create_sources(&self, configs: &[SourceConfig]) -> Result<Vec<Arc<dyn Source>>> {
        configs
            .iter()
            .map(|config| self.create_source(config))
            .collect()
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }
}
