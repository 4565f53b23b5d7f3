//! Keeta Metrics RPC Server - JSON-RPC backend for the metrics dashboard.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the keeta-metrics
//! library. With `--once` it prints a single snapshot as JSON and exits.

mod handler;
mod server;
mod wrapper;

use anyhow::Result;
use clap::Parser;
use keeta_metrics::{MetricsAggregator, MetricsConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "keeta-metrics-rpc")]
#[command(about = "JSON-RPC server for Keeta network and token metrics")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print one snapshot to stdout and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --debug when set
    let default_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("Starting Keeta Metrics RPC Server");

    let config = MetricsConfig::from_env()?;
    let aggregator = Arc::new(MetricsAggregator::from_config(&config)?);

    if args.once {
        let snapshot = aggregator.build_snapshot().await;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let addr = server::start_server(aggregator, &args.host, args.port).await?;

    // Print port for the parent process to read (intentional stdout)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
