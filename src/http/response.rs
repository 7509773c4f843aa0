//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a buffered upstream response into a caller response
//! - Preserve status and body exactly; filter headers
//!
//! # Design Decisions
//! - Hop-by-hop headers stripped automatically
//! - Content-Length recomputed from the buffered body

use axum::{body::Body, response::Response};

use crate::http::headers::forwardable_response_headers;
use crate::upstream::UpstreamResponse;

/// Build the caller response for an upstream response.
pub fn passthrough(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = forwardable_response_headers(&upstream.headers);
    response
}
