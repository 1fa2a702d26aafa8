//! Interfacer gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                     GATEWAY                       │
//!   Caller request         │  ┌─────────┐    ┌────────────┐    ┌───────────┐  │
//!   ───────────────────────┼─▶│  http   │───▶│  routing   │───▶│  forward  │──┼──▶ Upstream
//!                          │  │ server  │    │ RouteTable │    │  + retry  │  │    (zenflows,
//!                          │  └─────────┘    │ + rewrite  │    └─────┬─────┘  │     inbox, wallet,
//!                          │       │         └────────────┘          │        │     osh, here.com)
//!   Caller response        │       ▼                                 ▼        │
//!   ◀──────────────────────┼── discovery (/)                 response relay ◀─┼─── Upstream
//!                          │                                                   │    response
//!                          │  config · observability · resilience · lifecycle │
//!                          └──────────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from the environment (`ADDR`, `ZENFLOWS_URL`,
//! `INBOX_URL`, `WALLET_URL`, `OSH_URL`, `HERE_KEY`, `IFACER_LOG`) or from a
//! TOML file passed with `--config`.
//!
//! Exit codes: 1 for invalid configuration, 2 for listener failures, 0 after a
//! graceful shutdown.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;

use interfacer_gateway::config::{load_config, load_from_env};
use interfacer_gateway::lifecycle::{signals, Shutdown};
use interfacer_gateway::observability::{logging, metrics};
use interfacer_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "interfacer-gateway")]
#[command(about = "Reverse-proxy gateway for the Interfacer services", long_about = None)]
struct Cli {
    /// Read configuration from this TOML file instead of the environment.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map_or_else(load_from_env, load_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configs couldn't be loaded: {e}");
            return ExitCode::from(1);
        }
    };

    let _log_guard = logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_attempts = config.retries.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = match GatewayServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize gateway");
            return ExitCode::from(1);
        }
    };

    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %bind_address, error = %e, "error starting server");
            return ExitCode::from(2);
        }
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    match server.run(listener, shutdown.subscribe()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "error running server");
            ExitCode::from(2)
        }
    }
}
