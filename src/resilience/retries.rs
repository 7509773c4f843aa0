//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether an upstream failure is transient (no response received)
//! - Distinguish timeouts from other transport failures for status mapping
//!
//! # Design Decisions
//! - Every method is eligible: the retry only happens when the upstream never
//!   produced a response, so a partially processed upstream action cannot be
//!   observed twice through this gateway
//! - Builder, redirect and decode errors are local faults, never retried

/// What kind of failure an upstream call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The attempt deadline elapsed.
    Timeout,
    /// TCP/TLS connection could not be established.
    Connect,
    /// Connection dropped or reset before a response arrived.
    Transport,
    /// The request could not be built or the response could not be used.
    Local,
}

impl FailureKind {
    /// Whether one more attempt is allowed for this failure.
    pub fn is_transient(self) -> bool {
        !matches!(self, FailureKind::Local)
    }

    /// Label used for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connect",
            FailureKind::Transport => "transport",
            FailureKind::Local => "local",
        }
    }
}

/// Classify a `reqwest` error from `send()`.
pub fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_builder() || err.is_redirect() || err.is_decode() || err.is_status() {
        FailureKind::Local
    } else if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else {
        FailureKind::Transport
    }
}
