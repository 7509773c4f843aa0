//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream attempt:
//!     → per-attempt timeout (reqwest client deadline)
//!     → On failure: retries.rs (classify; transport failures are transient)
//!     → backoff.rs (jittered delay before the single retry)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Only failures where no response arrived are retried
//! - A received response (any status) ends the attempt loop

pub mod backoff;
pub mod retries;

pub use backoff::retry_delay;
pub use retries::{classify, FailureKind};
