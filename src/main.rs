//! backend-gateway
//!
//! Public entry point for an application server bound to loopback.
//!
//! ```text
//!     Client ──▶ listener ──▶ Forwarder ──▶ 127.0.0.1:8000 (application)
//!     Client ◀── response ◀── (verbatim, or 502 if unreachable)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use backend_gateway::config::{load_config, validate_config, GatewayConfig};
use backend_gateway::observability::{logging, metrics};
use backend_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "backend-gateway")]
#[command(about = "Transparent HTTP gateway in front of a loopback backend", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override upstream.port.
    #[arg(long)]
    upstream_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(port) = args.upstream_port {
        config.upstream.port = port;
    }
    validate_config(&config).map_err(backend_gateway::ConfigError::Validation)?;

    logging::init(&config.observability);

    tracing::info!("backend-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.authority(),
        connect_timeout_secs = config.timeouts.connect_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if !config.upstream.is_loopback() {
        tracing::warn!(
            upstream = %config.upstream.authority(),
            "Upstream is not a loopback address"
        );
    }

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    let server = GatewayServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
