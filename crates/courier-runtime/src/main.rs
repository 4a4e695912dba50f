//! `courier-node`: runs a Courier broker against Redis.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use courier_bus::{Broker, RedisTransport};
use courier_runtime::adapters::PrometheusRecorder;
use courier_runtime::config::NodeConfig;
use courier_runtime::NodeRuntime;
use courier_telemetry::{init_telemetry, TelemetryConfig};

/// Courier node
#[derive(Parser, Debug)]
#[command(name = "courier-node", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c')]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _telemetry = init_telemetry(TelemetryConfig::for_service("courier-node"))
        .context("could not initialize telemetry")?;

    let config = NodeConfig::load(&args.config).context("could not load config")?;
    let broker_config = config.broker_config().context("invalid broker configuration")?;

    let transport = RedisTransport::connect(&config.broker.redis_url, config.broker.pool_size)
        .await
        .context("could not connect to redis")?;

    let broker = Broker::connect(Arc::new(transport), broker_config)
        .await
        .context("could not create broker")?
        .with_metrics(Arc::new(PrometheusRecorder));

    let mut runtime = NodeRuntime::new(broker, config);
    runtime.start();

    info!("node is running; press Ctrl+C to stop");
    let signal = wait_for_shutdown_signal().await?;
    info!(signal, "shutdown signal received");

    runtime.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).context("could not install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("could not listen for SIGINT")?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("could not listen for Ctrl+C")?;
    Ok("Ctrl+C")
}
