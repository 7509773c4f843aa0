//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and env parsing handle syntax)
//! - Validate value ranges (timeouts > 0, port != 0, retry bound)
//! - Listener host must be a literal IP address
//! - Check that timeouts nest: the whole-request deadline must outlast
//!   every upstream attempt plus the backoff between them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::net::IpAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must not be 0")]
    ZeroPort,

    #[error("listener.host {0:?} is not an IP address")]
    InvalidHost(String),

    #[error("upstream.base_url {0:?} is not an absolute http(s) URL")]
    InvalidBaseUrl(String),

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("retries.max_retries must be 0 or 1, got {0}")]
    TooManyRetries(u32),

    #[error(
        "timeouts.request_secs ({request}s) must exceed upstream attempts x timeouts.upstream_secs plus retry backoff ({budget}s)"
    )]
    RequestTimeoutTooShort { request: u64, budget: u64 },

    #[error("schedule.window_days must be between 0 and 3660, got {0}")]
    InvalidWindow(i64),

    #[error("security.max_body_size must be greater than 0")]
    ZeroBodyLimit,
}

/// Worst-case seconds spent on one upstream call: every attempt times out and
/// the retry waits the longest backoff.
pub fn upstream_budget_secs(config: &GatewayConfig) -> u64 {
    let attempts = u64::from(config.retries.max_retries.min(1)) + 1;
    let backoff = if attempts > 1 {
        config.retries.max_delay_ms.div_ceil(1000)
    } else {
        0
    };
    attempts
        .saturating_mul(config.timeouts.upstream_secs)
        .saturating_add(backoff)
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidHost(config.listener.host.clone()));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(
            config.upstream.base_url.clone(),
        )),
    }

    let timeouts = &config.timeouts;
    if timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    if timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if config.retries.max_retries > 1 {
        errors.push(ValidationError::TooManyRetries(config.retries.max_retries));
    }

    let budget = upstream_budget_secs(config);
    if timeouts.request_secs > 0 && timeouts.request_secs <= budget {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: timeouts.request_secs,
            budget,
        });
    }

    if !(0..=3660).contains(&config.schedule.window_days) {
        errors.push(ValidationError::InvalidWindow(config.schedule.window_days));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
