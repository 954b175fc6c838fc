//! # beacon-hub
//!
//! Hub server binary — wires config, logging, the method registry, and
//! graceful shutdown together and serves the hub.

#![deny(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use beacon_server::config::ServerConfig;
use beacon_server::hub;
use beacon_server::rpc::registry::MethodRegistry;
use beacon_server::server::HubServer;

/// Beacon hub server.
#[derive(Parser, Debug)]
#[command(name = "beacon-hub", about = "Real-time fan-out hub server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "9220")]
    port: u16,

    /// Maximum concurrent WebSocket connections.
    #[arg(long)]
    max_connections: Option<usize>,

    /// Artificial delay of the sample `Greeting` method, in milliseconds.
    #[arg(long)]
    greeting_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig {
        host: args.host,
        port: args.port,
        ..ServerConfig::default()
    };
    if let Some(max_connections) = args.max_connections {
        config.max_connections = max_connections;
    }
    if let Some(greeting_delay_ms) = args.greeting_delay_ms {
        config.greeting_delay_ms = greeting_delay_ms;
    }

    let mut methods = MethodRegistry::new();
    hub::register_all(&mut methods, &config);

    let server = HubServer::new(config, methods);
    let (addr, handle) = server.listen().await?;
    tracing::info!(%addr, methods = ?server.methods().methods(), "hub ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    server.shutdown().graceful_shutdown(vec![handle], None).await;

    Ok(())
}
