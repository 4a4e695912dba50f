//! # Courier Node Runtime
//!
//! Process wiring for a Courier service.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging + Prometheus)
//! 2. Load configuration from `--config`
//! 3. Connect the Redis transport (fail fast)
//! 4. Connect the broker
//! 5. Start the demo dispatcher and requester, if enabled
//! 6. Wait for SIGINT/SIGTERM, then shut down
//!
//! ## Modules
//!
//! - `config/` - TOML node configuration
//! - `demo/` - ping/pong service
//! - `adapters/` - Prometheus metrics bridge

pub mod adapters;
pub mod config;
pub mod demo;

use std::time::Duration;

use courier_bus::Broker;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::NodeConfig;
use crate::demo::PingPongService;

/// How long shutdown waits for background tasks before giving up on them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A running node: the broker plus its background tasks.
pub struct NodeRuntime {
    broker: Broker,
    config: NodeConfig,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    pub fn new(broker: Broker, config: NodeConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            broker,
            config,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Spawn background tasks.
    pub fn start(&mut self) {
        if !self.config.demo.enabled {
            info!("demo disabled; broker idle");
            return;
        }

        let demo = PingPongService::new(self.broker.clone(), &self.config.demo);
        let route = self.config.demo.route();

        let server = demo.clone();
        self.tasks.push(tokio::spawn(async move {
            match server.serve().await {
                Ok(()) => {}
                Err(e) if e.is_closed() => info!(%route, "demo dispatcher stopped"),
                Err(e) => error!(%route, error = %e, "demo dispatcher failed"),
            }
        }));

        let shutdown = self.shutdown_rx.clone();
        self.tasks.push(tokio::spawn(async move {
            demo.run_requester(shutdown).await;
        }));

        info!(%route, "demo started");
    }

    /// Graceful shutdown
    ///
    /// 1. Signal background loops to stop
    /// 2. Close the broker, which ends its dispatchers
    /// 3. Wait briefly for tasks to finish
    pub async fn shutdown(self) {
        info!("initiating graceful shutdown");

        if let Err(e) = self.shutdown_tx.send(true) {
            warn!(error = %e, "no task listening for shutdown");
        }

        self.broker.close().await;

        for task in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "background task ended abnormally"),
                Err(_) => warn!("background task did not stop in time"),
            }
        }

        info!("shutdown complete");
    }
}
