//! OCM schedule gateway.
//!
//! A small HTTP gateway in front of IBM On Call Manager.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌──────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ net::listener ─▶ http::server (middleware)  │
//!                             │                      │                        │
//!                             │        ┌─────────────┼──────────────┐         │
//!                             │        ▼             ▼              ▼         │
//!                             │   GET /health   POST /getSchedule  /relay/*   │
//!                             │                      │              │         │
//!                             │                      ▼              │         │
//!                             │               schedule::client      │         │
//!                             │                      └──────┬───────┘         │
//!                             │                             ▼                 │
//!                             │            upstream::client (timeout, 1 retry)│──▶ OCM
//!     Client Response         │                             │                 │
//!     ◀───────────────────────┼──── http::response ◀────────┘                 │
//!                             └──────────────────────────────────────────────┘
//! ```

use ocm_gateway::config::load_config;
use ocm_gateway::lifecycle::{start, Shutdown};
use ocm_gateway::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    logging::init_logging(&config.observability)?;

    tracing::info!("ocm-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        upstream = %config.upstream.base_url,
        credentials = config.upstream.credentials.is_some(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        max_retries = config.retries.max_retries,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (server, listener) = match start(config).await {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
