//! Example calculator CLI.
//!
//! Registers the example crate's `#[intercept]`-marked types with a
//! container, then calls the intercepted calculator.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info calculator
//! ```

use std::sync::Arc;
use std::time::Duration;

use example::{Calculator, MemoryStore, ResultStore};
use interpose_container::{BoxError, ServiceCollection};
use interpose_discovery::{Component, DiscoveryConfig, DiscoveryRegistrar};
use interpose_proxy::ResolveProxy;
use interpose_tracing::{TracingFormat, TracingSetup};
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    TracingSetup::new()
        .with_level(Level::INFO)
        .with_format(TracingFormat::Compact)
        .init();

    let store = Arc::new(MemoryStore::default());
    let mut services = ServiceCollection::new();
    let shared: Arc<dyn ResultStore> = store.clone();
    services.add_instance(shared);

    let registrar = DiscoveryRegistrar::linked()
        .with_config(DiscoveryConfig::new().with_excluded("interpose_"));
    let bindings = registrar.discover_and_register(&Component::linked(), &mut services);
    tracing::info!(bindings = bindings.len(), "discovery finished");

    let container = services.build();
    let scope = container.create_scope();
    let calculator = scope
        .resolve_proxy::<dyn Calculator>()?
        .ok_or("calculator was not discovered")?;

    // Sync calls return nothing unless the interceptor recovers a failure.
    calculator.add(2, 3);
    let recovered = calculator
        .divide(1, 0)
        .and_then(|value| value.downcast::<i32>().ok());
    tracing::info!(?recovered, "divide by zero");

    // Async calls return immediately; the interceptor sees the result later.
    calculator.notify("done".to_string());
    tokio::time::sleep(Duration::from_millis(50)).await;

    tracing::info!(lines = ?store.lines(), "store contents");
    Ok(())
}
