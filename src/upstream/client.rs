//! Upstream HTTP client with per-attempt deadline and bounded retry.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

use crate::config::{GatewayConfig, RetryConfig};
use crate::observability::metrics;
use crate::resilience::{classify, retry_delay, FailureKind};

/// A request to send upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl UpstreamRequest {
    /// A body-less GET.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// A fully received upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failures where no usable upstream response was obtained.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Every allowed attempt hit the deadline.
    #[error("upstream timed out after {attempts} attempt(s) of {timeout:?}")]
    Timeout { attempts: u32, timeout: Duration },

    /// Every allowed attempt failed at the transport level.
    #[error("upstream unreachable after {attempts} attempt(s): {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be sent or the response body was unusable.
    #[error("upstream request failed: {0}")]
    Local(#[source] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Pooled HTTP client shared by all handlers.
///
/// Cloning is cheap; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryConfig,
}

impl UpstreamClient {
    /// Build a client from the timeout, retry and proxy settings.
    pub fn new(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let timeouts = &config.timeouts;
        let mut builder = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .timeout(timeouts.upstream())
            .redirect(reqwest::redirect::Policy::none())
            .pool_idle_timeout(Duration::from_secs(90));
        if !config.upstream.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(UpstreamError::Client)?;

        Ok(Self {
            client,
            timeout: timeouts.upstream(),
            retry: config.retries.clone(),
        })
    }

    /// Per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Total attempts allowed for one request.
    pub fn max_attempts(&self) -> u32 {
        self.retry.max_retries.min(1) + 1
    }

    /// Send `request`, retrying once if no response was received.
    ///
    /// Any received response is returned as-is, whatever its status.
    pub async fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let max_attempts = self.max_attempts();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let start = Instant::now();

            let err = match self.attempt(request).await {
                Ok(response) => {
                    metrics::record_upstream_attempt("response", start);
                    return Ok(response);
                }
                Err(AttemptError::Body(e)) => {
                    // Headers arrived, so this is not retried.
                    metrics::record_upstream_attempt("body_error", start);
                    tracing::warn!(url = %request.url, error = %e, "Upstream body read failed");
                    return Err(match classify(&e) {
                        FailureKind::Timeout => UpstreamError::Timeout {
                            attempts,
                            timeout: self.timeout,
                        },
                        _ => UpstreamError::Local(e),
                    });
                }
                Err(AttemptError::Send(e)) => e,
            };

            let kind = classify(&err);
            metrics::record_upstream_attempt(kind.as_str(), start);

            if !kind.is_transient() {
                tracing::error!(url = %request.url, error = %err, "Upstream request could not be sent");
                return Err(UpstreamError::Local(err));
            }

            if attempts < max_attempts {
                let backoff = retry_delay(&self.retry, attempts);
                tracing::info!(
                    url = %request.url,
                    attempt = attempts,
                    kind = kind.as_str(),
                    delay = ?backoff,
                    "Retrying after transient upstream failure"
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            tracing::warn!(
                url = %request.url,
                attempts,
                kind = kind.as_str(),
                error = %err,
                "Upstream failed, retries exhausted"
            );
            return Err(match kind {
                FailureKind::Timeout => UpstreamError::Timeout {
                    attempts,
                    timeout: self.timeout,
                },
                _ => UpstreamError::Unreachable {
                    attempts,
                    source: err,
                },
            });
        }
    }

    async fn attempt(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, AttemptError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(AttemptError::Send)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(AttemptError::Body)?;

        tracing::debug!(url = %request.url, status = %status, bytes = body.len(), "Upstream responded");

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

enum AttemptError {
    /// No response was received.
    Send(reqwest::Error),
    /// Status and headers were received but the body was not.
    Body(reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_attempts_is_bounded() {
        let mut config = GatewayConfig::default();
        config.retries.max_retries = 5;
        assert_eq!(UpstreamClient::new(&config).unwrap().max_attempts(), 2);

        config.retries.max_retries = 0;
        assert_eq!(UpstreamClient::new(&config).unwrap().max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable_after_two_attempts() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = GatewayConfig::default();
        config.upstream.system_proxy = false;
        config.timeouts.connect_secs = 1;
        config.timeouts.upstream_secs = 1;
        config.retries.base_delay_ms = 10;
        config.retries.max_delay_ms = 10;
        let client = UpstreamClient::new(&config).unwrap();

        let url = Url::parse(&format!("http://{}/x", addr)).unwrap();
        match client.send(&UpstreamRequest::get(url)).await {
            Err(UpstreamError::Unreachable { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected Unreachable, got {:?}", other),
        }
    }
}
