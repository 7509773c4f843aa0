//! Generic passthrough to the upstream API.
//!
//! `ANY /relay/{*path}` is forwarded to `{base_url}/{path}?{query}` with the
//! caller's headers (minus hop-by-hop) and buffered body. OCM credentials are
//! injected as Basic auth when configured and the caller sent none.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, HeaderValue, Method, Uri},
    response::Response,
};
use url::Url;

use crate::error::GatewayError;
use crate::http::headers::forwardable_request_headers;
use crate::http::response::passthrough;
use crate::http::server::AppState;
use crate::upstream::UpstreamRequest;

pub const RELAY_PREFIX: &str = "/relay";

pub async fn relay_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    inbound: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, GatewayError> {
    // The body is bounded by the router's RequestBodyLimitLayer.
    let body = body?;

    let tail = uri.path().strip_prefix(RELAY_PREFIX).unwrap_or_default();
    let url = upstream_url(&state.base_url, tail, uri.query())?;

    let mut headers = forwardable_request_headers(&inbound);
    if !headers.contains_key(header::AUTHORIZATION) {
        if let Some(creds) = &state.config.upstream.credentials {
            let value = HeaderValue::from_str(&basic_auth(&creds.username, &creds.password))
                .map_err(|e| GatewayError::Internal(format!("invalid credential header: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }
    }

    tracing::debug!(method = %method, url = %url, "Relaying request");

    let upstream = UpstreamRequest {
        method,
        url,
        headers,
        body: (!body.is_empty()).then_some(body),
    };

    let response = state.upstream.send(&upstream).await?;
    Ok(passthrough(response))
}

/// Join the relay tail onto the base URL, keeping the raw query.
pub fn upstream_url(base: &Url, tail: &str, query: Option<&str>) -> Result<Url, GatewayError> {
    let base_str = base.as_str().trim_end_matches('/');
    let tail = tail.trim_start_matches('/');
    let mut url = Url::parse(&format!("{base_str}/{tail}"))
        .map_err(|e| GatewayError::BadRequest(format!("Invalid relay path: {e}")))?;
    url.set_query(query);
    Ok(url)
}

/// `Basic base64(username:password)`.
pub fn basic_auth(username: &str, password: &str) -> String {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}
