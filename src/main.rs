//! ZenRelay service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                   ZENRELAY                    │
//!                     │                                               │
//!   HTTP / WebSocket  │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!   ──────────────────┼─▶│  http   │───▶│   app    │───▶│  wallet  │──┼──▶ JSON-RPC
//!                     │  │ server  │    │ DemoApp  │    │negotiator│  │    endpoints
//!                     │  └────┬────┘    └────┬─────┘    └────┬─────┘  │
//!                     │       │         ┌────┴─────┐         │        │
//!                     │       │         │swap/badge│         │        │
//!                     │       │         │assistant │         │        │
//!                     │       │         └──────────┘         │        │
//!                     │       │      ┌──────────┐            │        │
//!                     │       └──────│ EventBus │◀───────────┘        │
//!                     │              └──────────┘                     │
//!                     │  config · observability · lifecycle           │
//!                     └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use zenrelay::config::{load_config, AppConfig};
use zenrelay::lifecycle::{signals, startup};
use zenrelay::observability::{logging, metrics};
use zenrelay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "zenrelay")]
#[command(about = "Wallet and network negotiator for ZenChain Testnet", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "zenrelay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        wallet_enabled = config.wallet.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    let provider = startup::build_provider(&config)?;
    let bind_address = config.listener.bind_address.clone();
    let app = startup::initialize(config, provider, &shutdown).await?;

    let listener = TcpListener::bind(&bind_address).await?;
    let server = HttpServer::new(app, shutdown.clone());
    server.run(listener).await?;

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}
