//! Configuration types for the multisource system
//!
//! This module defines all configuration structures used throughout the crate.

use crate::endpoint::Endpoint;
use serde::{Deserialize, Serialize};

/// Default number of sources queried at the same time
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Main multisource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSourceConfig {
    /// Sources to aggregate, in construction order
    pub sources: Vec<SourceConfig>,

    /// Override targets; when non-empty every endpoint is rewritten to them
    #[serde(default)]
    pub default_targets: Vec<String>,

    /// Optional aggregator settings
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

impl MultiSourceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            default_targets: Vec::new(),
            aggregator: AggregatorConfig::default(),
        }
    }

    /// Add a source
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the override targets
    pub fn with_default_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.default_targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.sources.is_empty() {
            return Err(crate::Error::config("No sources configured"));
        }

        if self.default_targets.iter().any(|t| t.trim().is_empty()) {
            return Err(crate::Error::config("Default targets cannot contain blank entries"));
        }

        self.aggregator.validate()?;

        for source in &self.sources {
            source.validate()?;
        }

        Ok(())
    }
}

impl Default for MultiSourceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Maximum number of sources queried at the same time
    ///
    /// Bounds outbound connections when many sources are configured.
    /// Sources beyond the limit wait for a slot.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// How source failures are reported
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl AggregatorConfig {
    /// Validate the aggregator configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.concurrency == 0 {
            return Err(crate::Error::config("Aggregator concurrency must be > 0"));
        }
        Ok(())
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// How the aggregator reports failing sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Keep every failure, attributed to its source
    #[default]
    CollectAll,
    /// Keep only the failure that reached the merge step last
    LastWins,
}

/// Source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Fixed endpoints held in memory
    Memory {
        /// Optional source name (defaults to "memory")
        #[serde(default)]
        name: Option<String>,
        /// Endpoints to serve
        #[serde(default)]
        endpoints: Vec<Endpoint>,
    },

    /// JSON file containing an array of endpoints
    File {
        /// Path to the file
        path: String,
        /// Poll interval for change notifications (disabled when absent)
        #[serde(default)]
        watch_interval_secs: Option<u64>,
    },

    /// HTTP endpoint returning a JSON array of endpoints
    Http {
        /// URL to fetch endpoints from
        url: String,
        /// Poll interval for change notifications in seconds
        interval_secs: u64,
    },

    /// Custom source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Memory { .. } => Ok(()),
            SourceConfig::File {
                path,
                watch_interval_secs,
            } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File source path cannot be empty"));
                }
                if *watch_interval_secs == Some(0) {
                    return Err(crate::Error::config("File source watch interval must be > 0"));
                }
                Ok(())
            }
            SourceConfig::Http { url, interval_secs } => {
                if url.is_empty() {
                    return Err(crate::Error::config("HTTP source URL cannot be empty"));
                }
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "HTTP source URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if *interval_secs == 0 {
                    return Err(crate::Error::config("HTTP source interval must be > 0"));
                }
                Ok(())
            }
            SourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom source factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom source config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::Memory { .. } => "memory",
            SourceConfig::File { .. } => "file",
            SourceConfig::Http { .. } => "http",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}
