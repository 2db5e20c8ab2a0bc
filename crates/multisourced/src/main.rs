// # multisourced - Endpoint Aggregation Daemon
//
// The daemon is a thin integration layer. All aggregation logic lives in
// multisource-core; this binary only wires it up.
//
// The multisourced daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Loading the source list from a JSON file
// 3. Registering source types and building the aggregator
// 4. Collecting on a fixed interval and whenever a source reports a change
//
// ## Configuration
//
// ### Sources
// - `MULTISOURCE_CONFIG`: Path to the JSON source configuration (required)
//
// ### Overrides
// - `MULTISOURCE_DEFAULT_TARGETS`: Comma-separated override targets,
//   replacing `default_targets` from the file
// - `MULTISOURCE_CONCURRENCY`: Maximum number of sources queried at once
//
// ### Schedule
// - `MULTISOURCE_INTERVAL_SECS`: Seconds between collections (default 60)
// - `MULTISOURCE_ONCE`: Collect once, print the endpoints as JSON and exit
//
// ### Logging
// - `MULTISOURCE_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Example
//
// ```bash
// export MULTISOURCE_CONFIG=/etc/multisource/config.json
// export MULTISOURCE_DEFAULT_TARGETS=203.0.113.10,2001:db8::10
// export MULTISOURCE_INTERVAL_SECS=30
//
// multisourced
// ```

use anyhow::{Context, Result};
use multisource_core::{Collection, MultiSource, MultiSourceConfig, Source, SourceRegistry};
use std::env;
use std::fmt::Display;
use std::net::IpAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Default seconds between collections
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Upper bound for `MULTISOURCE_CONCURRENCY`
const MAX_CONCURRENCY: usize = 1024;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    config_path: String,
    default_targets: Option<Vec<String>>,
    concurrency: Option<usize>,
    interval_secs: u64,
    once: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            config_path: env::var("MULTISOURCE_CONFIG").unwrap_or_default(),
            default_targets: env::var("MULTISOURCE_DEFAULT_TARGETS")
                .ok()
                .map(|s| split_list(&s)),
            concurrency: parse_env("MULTISOURCE_CONCURRENCY")?,
            interval_secs: parse_env("MULTISOURCE_INTERVAL_SECS")?
                .unwrap_or(DEFAULT_INTERVAL_SECS),
            once: env::var("MULTISOURCE_ONCE")
                .map(|s| is_truthy(&s))
                .unwrap_or(false),
            log_level: env::var("MULTISOURCE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks presence of the config file, numeric ranges, override target
    /// syntax and the log level. The source list itself is validated by
    /// multisource-core once the file is loaded.
    fn validate(&self) -> Result<()> {
        if self.config_path.is_empty() {
            anyhow::bail!(
                "MULTISOURCE_CONFIG is required. \
                Set it via: export MULTISOURCE_CONFIG=/etc/multisource/config.json"
            );
        }

        if !std::path::Path::new(&self.config_path).is_file() {
            anyhow::bail!(
                "MULTISOURCE_CONFIG does not point to a file: {}",
                self.config_path
            );
        }

        if let Some(concurrency) = self.concurrency
            && (concurrency == 0 || concurrency > MAX_CONCURRENCY)
        {
            anyhow::bail!(
                "MULTISOURCE_CONCURRENCY must be between 1 and {}. Got: {}",
                MAX_CONCURRENCY,
                concurrency
            );
        }

        if !(1..=86_400).contains(&self.interval_secs) {
            anyhow::bail!(
                "MULTISOURCE_INTERVAL_SECS must be between 1 and 86400 seconds. Got: {}",
                self.interval_secs
            );
        }

        if let Some(targets) = &self.default_targets {
            for target in targets {
                validate_target(target)?;
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "MULTISOURCE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Apply environment overrides on top of the file configuration
    fn apply_overrides(&self, sources: &mut MultiSourceConfig) {
        if let Some(targets) = &self.default_targets {
            sources.default_targets = targets.clone();
        }
        if let Some(concurrency) = self.concurrency {
            sources.aggregator.concurrency = concurrency;
        }
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Parse an optional environment variable, rejecting malformed values
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, value, e)),
        _ => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Validate that an override target is an IP address or a host name
fn validate_target(target: &str) -> Result<()> {
    if target.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    validate_domain_name(target.trim_end_matches('.'))
        .with_context(|| format!("Invalid override target '{}'", target))
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; catches common typos rather than every
/// malformed name.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    // Logs go to stderr so `MULTISOURCE_ONCE` output stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting multisourced daemon");

    let aggregator = match build_aggregator(&config) {
        Ok(aggregator) => aggregator,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let outcome = if config.once {
            run_once(&aggregator).await
        } else {
            run_daemon(&aggregator, Duration::from_secs(config.interval_secs)).await
        };

        match outcome {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DaemonExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Load the source configuration and build the aggregator
fn build_aggregator(config: &Config) -> Result<MultiSource> {
    let raw = std::fs::read_to_string(&config.config_path)
        .with_context(|| format!("Failed to read {}", config.config_path))?;

    let mut sources = MultiSourceConfig::from_json(&raw)
        .with_context(|| format!("Invalid source configuration in {}", config.config_path))?;
    config.apply_overrides(&mut sources);

    let registry = SourceRegistry::with_builtin();

    #[cfg(feature = "http")]
    {
        info!("Registering HTTP source");
        multisource_http::register(&registry);
    }

    let children = registry.create_sources(&sources.sources)?;
    let aggregator = MultiSource::from_config(children, &sources)?;

    info!(
        "Configured {} source(s), concurrency {}, {} override target(s)",
        aggregator.len(),
        aggregator.concurrency(),
        aggregator.default_targets().len()
    );

    Ok(aggregator)
}

/// Collect once and print the endpoints as JSON on stdout
///
/// The endpoints are printed even when some sources failed; the failures
/// turn into a runtime error afterwards.
async fn run_once(aggregator: &MultiSource) -> Result<()> {
    let collection = aggregator.collect(&CancellationToken::new()).await;
    report(&collection);

    let (endpoints, error) = collection.into_parts();
    println!("{}", serde_json::to_string_pretty(&endpoints)?);

    match error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Collect on every tick and every change notification until shutdown
async fn run_daemon(aggregator: &MultiSource, interval: Duration) -> Result<()> {
    let mut signals = ShutdownSignals::install()?;
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let signal = signals.recv().await;
        info!("Received shutdown signal: {}", signal);
        shutdown.cancel();
    });

    let changed = Arc::new(Notify::new());
    let notifier = Arc::clone(&changed);
    aggregator.add_event_handler(
        &cancel,
        Arc::new(move || {
            notifier.notify_one();
        }),
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Collecting every {:?}", interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            _ = changed.notified() => {
                info!("A source reported a change");
                ticker.reset();
            }
        }

        let collection = aggregator.collect(&cancel).await;
        if cancel.is_cancelled() {
            break;
        }
        report(&collection);
    }

    info!("Shutting down daemon");
    Ok(())
}

/// Log the outcome of one collection; each endpoint is logged at debug level
fn report(collection: &Collection) {
    for endpoint in &collection.endpoints {
        debug!("Endpoint {}", endpoint);
    }

    for failure in &collection.failures {
        warn!("Source {} failed: {}", failure.source_name, failure.error);
    }

    if collection.is_complete() {
        info!("Collected {} endpoint(s)", collection.endpoints.len());
    } else {
        warn!(
            "Collected {} endpoint(s), {} source(s) failed",
            collection.endpoints.len(),
            collection.failures.len()
        );
    }
}

/// Shutdown signal listeners (SIGTERM, SIGINT)
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for either signal and return its name
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Fallback for non-Unix platforms (CTRL-C only)
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    }
}
