//! Minimal embedding example for multisource-core
//!
//! This example demonstrates using multisource-core as a library in a custom
//! application. The application owns the sources, decides when to collect
//! and decides what to do with partial results.

use multisource_core::endpoint::{Endpoint, RecordType, Ttl};
use multisource_core::source::MemorySource;
use multisource_core::traits::{EventHandler, Source};
use multisource_core::{Error, MultiSource, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Custom source standing in for a service catalogue
struct CatalogSource {
    services: Vec<(&'static str, &'static str)>,
}

#[async_trait::async_trait]
impl Source for CatalogSource {
    async fn endpoints(&self, _cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        // Simulate a remote lookup
        tokio::time::sleep(Duration::from_millis(50)).await;

        Ok(self
            .services
            .iter()
            .map(|(name, target)| {
                Endpoint::with_ttl(*name, RecordType::Cname, Ttl(120), [*target])
                    .with_label("owner", "catalog")
            })
            .collect())
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, _handler: EventHandler) {
        // The catalogue has no change feed; the application polls instead
    }

    fn source_name(&self) -> &str {
        "catalog"
    }
}

/// Custom source that fails every other call
struct FlakySource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Source for FlakySource {
    async fn endpoints(&self, _cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        if self.calls.fetch_add(1, Ordering::SeqCst).is_multiple_of(2) {
            return Err(Error::source_failed("flaky", "upstream timed out"));
        }
        Ok(vec![Endpoint::new("flaky.example.com", RecordType::A, ["192.0.2.77"])])
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, _handler: EventHandler) {}

    fn source_name(&self) -> &str {
        "flaky"
    }
}

fn print_endpoints(endpoints: &[Endpoint]) {
    for ep in endpoints {
        println!("   {}", ep);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Embedded multisource-core Example ===\n");

    // Create custom components
    let memory = Arc::new(MemorySource::named(
        "static",
        vec![Endpoint::new("legacy.example.com", RecordType::A, ["192.0.2.10"])],
    ));
    let catalog = Arc::new(CatalogSource {
        services: vec![
            ("api.example.com", "lb-1.example.net"),
            ("www.example.com", "cdn.example.net"),
        ],
    });
    let flaky = Arc::new(FlakySource {
        calls: AtomicUsize::new(0),
    });

    let children: Vec<Arc<dyn Source>> = vec![memory.clone() as Arc<dyn Source>, catalog, flaky];
    let aggregator = MultiSource::new(children, Vec::new()).with_concurrency(2);
    let cancel = CancellationToken::new();

    // First collection: the flaky source fails, the others still contribute
    println!("1. Collecting (flaky source fails this time)...");
    let collection = aggregator.collect(&cancel).await;
    print_endpoints(&collection.endpoints);
    for failure in &collection.failures {
        println!("   failed: {}", failure);
    }

    // Second collection: every source succeeds
    println!("\n2. Collecting again...");
    match aggregator.endpoints(&cancel).await {
        Ok(endpoints) => print_endpoints(&endpoints),
        Err(e) => println!("   unexpected: {}", e),
    }

    // Change notifications are forwarded to every child
    println!("\n3. Registering a change handler and updating the static source...");
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    aggregator.add_event_handler(
        &cancel,
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    memory
        .set_endpoints(vec![Endpoint::new("legacy.example.com", RecordType::A, ["192.0.2.11"])])
        .await;
    println!("   change notifications received: {}", changes.load(Ordering::SeqCst));

    // Override targets replace whatever the sources report
    println!("\n4. Collecting with override targets...");
    let overridden = MultiSource::new(
        vec![memory.clone() as Arc<dyn Source>],
        vec!["203.0.113.5".to_string(), "2001:db8::5".to_string()],
    );
    let collection = overridden.collect(&cancel).await;
    print_endpoints(&collection.endpoints);

    cancel.cancel();

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Collection lifecycle is fully controlled by application");
    println!("- A failing source never hides healthy ones");
    println!("- All components are custom (not multisourced defaults)");

    Ok(())
}
