//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server from a validated configuration
//! - Bind the listener on the configured host and port
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::net::{bind, ListenerError};
use crate::upstream::UpstreamError;

/// Errors that stop the process before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid upstream base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error(transparent)]
    Client(#[from] UpstreamError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Build the server and bind its listener.
pub async fn start(config: GatewayConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let server = HttpServer::new(config)?;
    let listener = bind(&server.config().listener).await?;
    Ok((server, listener))
}
