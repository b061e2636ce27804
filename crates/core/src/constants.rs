//! Shared constants

use std::time::Duration;

/// Prefix of every exposed metric name (`rflink_temp`, `rflink_hum`, ...)
pub const NAMESPACE: &str = "rflink";

/// Default idle time after which a sensor's metrics are withdrawn
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// How many sweeps happen per timeout period
pub const SWEEPS_PER_TIMEOUT: u32 = 4;

/// Floor for the sweep period; `tokio::time::interval` rejects a zero period
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Sweep period for a given expiry timeout, never below [`MIN_SWEEP_PERIOD`]
pub fn sweep_period(timeout: Duration) -> Duration {
    (timeout / SWEEPS_PER_TIMEOUT).max(MIN_SWEEP_PERIOD)
}
