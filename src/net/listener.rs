//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured `host:port`
//! - Bind, reporting failures as `ListenerError::Bind` so startup exits non-zero

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured address could not be parsed.
    Address(String, std::net::AddrParseError),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Address(addr, e) => write!(f, "Invalid listen address {}: {}", addr, e),
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Address(_, e) => Some(e),
            ListenerError::Bind(_, e) => Some(e),
        }
    }
}

/// Bind to the configured host and port.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let bind_address = config.bind_address();
    let addr: SocketAddr = bind_address
        .parse()
        .map_err(|e| ListenerError::Address(bind_address.clone(), e))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ListenerError::Bind(addr, e))?;

    let local_addr = listener.local_addr().map_err(|e| ListenerError::Bind(addr, e))?;
    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}
