//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routing)
//!     → health.rs | relay.rs | schedule handler
//!     → upstream client (timeout, bounded retry)
//!     → response.rs + headers.rs (status/body preserved, hop-by-hop stripped)
//!     → Send to client
//! ```

pub mod headers;
pub mod health;
pub mod relay;
pub mod response;
pub mod server;

pub use server::{build_router, AppState, HttpServer};
