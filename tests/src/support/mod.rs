//! # Test Fixtures
//!
//! Brokers wired to a shared [`InMemoryTransport`], standing in for several
//! service processes that talk through one store.

use std::sync::Arc;
use std::time::Duration;

use courier_bus::{
    Broker, BrokerConfig, BrokerError, BrokerMetrics, InMemoryTransport, RequestHandler,
};
use courier_types::{RouteId, ServiceId};
use tokio::task::JoinHandle;

/// Upper bound for any single blocking assertion.
pub const GUARD: Duration = Duration::from_secs(5);

/// Environment variable naming a Redis server for `#[ignore]` tests.
pub const REDIS_URL_ENV: &str = "COURIER_TEST_REDIS_URL";

/// One store, one broker per simulated service.
pub struct Harness {
    pub transport: Arc<InMemoryTransport>,
    pub broker: Broker,
    pub metrics: Arc<BrokerMetrics>,
}

impl Harness {
    /// Broker for `service` with default settings.
    pub async fn new(service: i64) -> Self {
        Self::with_config(BrokerConfig::new(ServiceId(service))).await
    }

    pub async fn with_config(config: BrokerConfig) -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let metrics = Arc::new(BrokerMetrics::new());
        let broker = Broker::connect(transport.clone(), config)
            .await
            .expect("in-memory broker")
            .with_metrics(metrics.clone());
        Self {
            transport,
            broker,
            metrics,
        }
    }

    /// Another broker on the same store, as if in a different process.
    pub async fn peer(&self, config: BrokerConfig) -> Broker {
        Broker::connect(self.transport.clone(), config)
            .await
            .expect("in-memory broker")
    }
}

/// Run `broker.receive(route, handler)` on its own task.
pub fn spawn_dispatcher<H: RequestHandler>(
    broker: &Broker,
    route: RouteId,
    handler: H,
) -> JoinHandle<Result<(), BrokerError>> {
    let broker = broker.clone();
    tokio::spawn(async move { broker.receive(route, handler).await })
}

/// Redis URL for live tests, if configured.
pub fn redis_url() -> Option<String> {
    std::env::var(REDIS_URL_ENV).ok()
}
