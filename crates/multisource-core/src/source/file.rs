// # File Source
//
// Serves endpoints from a JSON file on disk.
//
// ## Purpose
//
// Lets operators publish a fixed set of records (legacy hosts, external
// services) next to dynamically discovered ones. The file is read on every
// collection, so edits take effect on the next cycle without a restart.
//
// ## File Format
//
// Either a bare array of endpoints, or the versioned envelope:
//
// ```json
// {
//   "version": "1.0",
//   "endpoints": [
//     {
//       "dns_name": "legacy.example.com",
//       "targets": ["192.0.2.10"],
//       "record_type": "A",
//       "record_ttl": 300
//     }
//   ]
// }
// ```
//
// A missing file is an error, not an empty list: silently serving nothing
// would make the downstream reconciler delete every record the file owned.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::config::SourceConfig;
use crate::endpoint::Endpoint;
use crate::source::poller::spawn_change_poller;
use crate::traits::{EventHandler, Source, SourceFactory};

/// Endpoint file format version
const ENDPOINT_FILE_VERSION: &str = "1.0";

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum EndpointFileFormat {
    Bare(Vec<Endpoint>),
    Versioned {
        version: String,
        endpoints: Vec<Endpoint>,
    },
}

/// File-backed endpoint source
///
/// # Example
///
/// ```rust,no_run
/// use multisource_core::source::FileSource;
/// use multisource_core::traits::Source;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = FileSource::new("/etc/multisource/static.json");
///     let endpoints = source.endpoints(&CancellationToken::new()).await?;
///     println!("{} endpoint(s)", endpoints.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    watch_interval: Option<Duration>,
}

impl FileSource {
    /// Create a file source; the file is not touched until endpoints are requested
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("file:{}", path.display());

        Self {
            path,
            name,
            watch_interval: None,
        }
    }

    /// Poll the file's modification time at `interval` once a handler is registered
    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = Some(interval);
        self
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Endpoint>, Error> {
        let path = self.path.as_path();
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::source_failed(
                &self.name,
                format!("Failed to read endpoint file {}: {}", path.display(), e),
            )
        })?;

        let parsed: EndpointFileFormat = serde_json::from_str(&content).map_err(|e| {
            Error::invalid_input(format!(
                "Failed to parse endpoint file {}: {}",
                path.display(),
                e
            ))
        })?;

        let endpoints = match parsed {
            EndpointFileFormat::Bare(endpoints) => endpoints,
            EndpointFileFormat::Versioned { version, endpoints } => {
                if version != ENDPOINT_FILE_VERSION {
                    tracing::warn!(
                        "Endpoint file version mismatch: expected {}, got {}. \
                        Attempting to load anyway.",
                        ENDPOINT_FILE_VERSION,
                        version
                    );
                }
                endpoints
            }
        };

        tracing::debug!(
            "Loaded {} endpoint(s) from {}",
            endpoints.len(),
            path.display()
        );
        Ok(endpoints)
    }
}

#[async_trait]
impl Source for FileSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, Error> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled(format!(
                "Reading {} was cancelled",
                self.path.display()
            ))),
            loaded = self.load() => loaded,
        }
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        let Some(interval) = self.watch_interval else {
            tracing::debug!("Source {} has no watch interval, ignoring handler", self.name);
            return;
        };

        let path = self.path.clone();
        spawn_change_poller(&*self.name, interval, cancel.clone(), handler, move || {
            let path = path.clone();
            async move {
                let metadata = fs::metadata(&path).await?;
                Ok::<_, Error>(metadata.modified()?)
            }
        });
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Factory for creating file sources
pub struct FileSourceFactory;

impl SourceFactory for FileSourceFactory {
    fn create(&self, config: &SourceConfig) -> Result<Arc<dyn Source>, Error> {
        match config {
            SourceConfig::File {
                path,
                watch_interval_secs,
            } => {
                let mut source = FileSource::new(path);
                if let Some(secs) = watch_interval_secs {
                    source = source.with_watch_interval(Duration::from_secs(*secs));
                }
                Ok(Arc::new(source))
            }
            _ => Err(Error::config("Invalid config for file source")),
        }
    }
}
