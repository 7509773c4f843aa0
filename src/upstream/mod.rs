//! Outbound HTTP to the upstream API.
//!
//! # Data Flow
//! ```text
//! UpstreamRequest (method, url, headers, buffered body)
//!     → client.rs (attempt with deadline)
//!     → transient failure? backoff, one more attempt
//!     → UpstreamResponse (status, headers, body) | UpstreamError
//! ```
//!
//! # Design Decisions
//! - Bodies are buffered so a retry can resend them byte-for-byte
//! - Redirects are not followed; 3xx is an upstream answer like any other
//! - Dropping the returned future aborts the in-flight attempt

pub mod client;

pub use client::{UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse};
