//! Courier relay daemon.
//!
//! Exposes the exchange HTTP surface and runs until interrupted. Storage is
//! in-memory; durable deployments swap the store providers behind
//! `AppState::with_controller`.

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use url::Url;

use service::{AppState, Config};

/// Courier - zero-knowledge encrypted bundle relay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the HTTP listener to
    #[arg(long, default_value = "0.0.0.0")]
    listen: String,

    /// Port to listen on for HTTP requests
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// External base URL embedded in retrieval locators (defaults to the
    /// listen address)
    #[arg(long)]
    external_url: Option<Url>,

    /// Base URL of the trust gateway hosting issuer key directories
    #[arg(long, default_value = "https://gateway.courier.example")]
    trust_gateway: Url,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    tracing::info!("Starting courier relay");

    let listen_addr = SocketAddr::from_str(&format!("{}:{}", args.listen, args.port))?;
    let mut config = Config::new(listen_addr, args.external_url, args.trust_gateway)?;
    config.log_level = log_level;

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let graceful_shutdown = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    };
    tokio::spawn(graceful_shutdown);

    service::http_server::run(state, shutdown_rx).await?;

    tracing::info!("Relay shutdown complete");
    Ok(())
}
