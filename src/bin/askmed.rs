//! askmed, the askme daemon.
//!
//! Serves `POST /api/rag` over HTTP, backed by a single shared
//! [`RagClient`](askme::RagClient) built from configuration.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use askme::server::config::{Config, Secrets};
use askme::server::{AppState, serve};
use askme::{AskError, RagClient};

/// askme daemon: resilient RAG question endpoint.
#[derive(Parser)]
#[command(name = "askmed")]
#[command(version)]
#[command(about = "askme RAG service daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Listen address, overriding the configuration.
    #[arg(short, long, env = "ASKME_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let client = Arc::new(build_client(&config, &secrets)?);
    let state = Arc::new(AppState::new(client, config.retry_policy()));

    let address = args.address.unwrap_or_else(|| config.server.address.clone());
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| AskError::Configuration(format!("Invalid address: {e}")))?;
    let listener = TcpListener::bind(addr).await?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        api_version = ?config.provider.api_version,
        "askmed starting"
    );

    serve(listener, state, shutdown_signal()).await?;
    info!("askmed stopped");
    Ok(())
}

/// Build the process-wide client. The cache and breaker it owns live for
/// the lifetime of the daemon.
fn build_client(config: &Config, secrets: &Secrets) -> Result<RagClient, AskError> {
    let key = secrets.api_key().ok_or_else(|| {
        AskError::Configuration(format!(
            "No API key: set {} or create ~/.askme/secrets.toml",
            askme::server::config::API_KEY_ENV
        ))
    })?;
    config.client_builder().vectara(key).build()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
