//! Periodic expiration of idle sensors

use log::{debug, info, trace};
use rflink_prom_core::{sweep_period, ExpositionSink, Registry, MIN_SWEEP_PERIOD};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// Walks the whole registry every quarter timeout and withdraws idle metrics
pub struct ExpirationSweeper<S: ExpositionSink> {
    registry: Arc<Registry<S>>,
    timeout: Duration,
}

impl<S: ExpositionSink> ExpirationSweeper<S> {
    /// The sweep period is clamped to [`MIN_SWEEP_PERIOD`], so any timeout is accepted
    pub fn new(registry: Arc<Registry<S>>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn period(&self) -> Duration {
        sweep_period(self.timeout)
    }

    /// One pass over every known metric; returns how many were withdrawn
    pub fn sweep(&self) -> usize {
        debug!(
            "Checking all expired metrics after {} seconds of absence",
            self.timeout.as_secs()
        );
        let start = Instant::now();
        let expired = self.registry.enforce_expiration(self.timeout);

        if expired > 0 {
            info!(
                "Expired {} metric(s), {} of {} still exposed",
                expired,
                self.registry.registered_count(),
                self.registry.metric_count()
            );
        }
        trace!("Sweep took {:?}", start.elapsed());
        expired
    }

    /// Run the sweep loop forever
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.sweep();
        }
    }
}
