//! Delay before an upstream retry.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay to wait after `failed_attempts` failed attempts.
///
/// The nominal delay doubles per failure from `base_delay_ms` and is capped at
/// `max_delay_ms`. The returned delay is drawn uniformly from the upper half of
/// the nominal delay, so concurrent callers retrying the same outage spread out.
pub fn retry_delay(config: &RetryConfig, failed_attempts: u32) -> Duration {
    if failed_attempts == 0 {
        return Duration::ZERO;
    }

    let factor = 1u64
        .checked_shl(failed_attempts - 1)
        .unwrap_or(u64::MAX);
    let nominal = config
        .base_delay_ms
        .saturating_mul(factor)
        .min(config.max_delay_ms);

    let floor = nominal / 2;
    let delay = if nominal > floor {
        rand::thread_rng().gen_range(floor..=nominal)
    } else {
        nominal
    };
    Duration::from_millis(delay)
}
