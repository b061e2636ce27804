//! Live exposed state for one (sensor, field) pair

use crate::sink::{ExpositionSink, MetricDescriptor, SinkError};
use log::{debug, info, warn};
use rflink_prom_types::SensorIdentity;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// One exposed gauge
///
/// `value`, `last_seen` and `registered` change together under the metric's
/// mutex. `last_seen` and `registered` are mirrored in atomics so the sweeper
/// can do its first expiry check without taking the lock; they are only ever
/// written while the mutex is held.
pub struct Metric<S: ExpositionSink> {
    sensor: SensorIdentity,
    field: String,
    descriptor: MetricDescriptor,
    handle: S::Handle,
    sink: Arc<S>,
    /// Reference point for `last_seen`
    origin: Instant,
    value: Mutex<f64>,
    /// Nanoseconds since `origin`
    last_seen: AtomicU64,
    registered: AtomicBool,
    /// Consecutive registrations the sink refused
    rejections: AtomicU32,
}

impl<S: ExpositionSink> Metric<S> {
    /// Build a metric that is not yet exposed; the first [`set`](Self::set) registers it
    pub fn new(
        sensor: SensorIdentity,
        field: impl Into<String>,
        descriptor: MetricDescriptor,
        sink: Arc<S>,
    ) -> Result<Self, SinkError> {
        let handle = sink.describe(&descriptor)?;
        Ok(Self {
            sensor,
            field: field.into(),
            descriptor,
            handle,
            sink,
            origin: Instant::now(),
            value: Mutex::new(0.0),
            last_seen: AtomicU64::new(0),
            registered: AtomicBool::new(false),
            rejections: AtomicU32::new(0),
        })
    }

    /// Record a new reading, (re-)registering the metric with the sink if needed
    pub fn set(&self, value: f64) {
        debug!("[{}|{}] Locking to update value", self.sensor, self.field);
        let mut current = self.lock_value();

        if !self.registered.load(Ordering::Acquire) {
            match self.sink.register(&self.handle) {
                Ok(()) => {
                    self.registered.store(true, Ordering::Release);
                    self.rejections.store(0, Ordering::Release);
                    info!(
                        "Registered gauge {}: vendor={}, id={}, name={}",
                        self.descriptor.fq_name(),
                        self.sensor.vendor,
                        self.sensor.id,
                        self.friendly_name()
                    );
                }
                Err(e) => {
                    let attempts = self.rejections.fetch_add(1, Ordering::AcqRel) + 1;
                    if attempts == 1 {
                        warn!("[{}|{}] Cannot register gauge: {}", self.sensor, self.field, e);
                    } else {
                        debug!(
                            "[{}|{}] Gauge still rejected after {} attempts: {}",
                            self.sensor, self.field, attempts, e
                        );
                    }
                }
            }
        }

        self.sink.set_value(&self.handle, value);
        *current = value;
        self.touch();
        debug!("[{}|{}] New value set: {:.2}", self.sensor, self.field, value);
    }

    /// Whether the metric has been idle for longer than `timeout`
    ///
    /// Lock-free, so the answer may be stale by the time it is used.
    pub fn has_expired(&self, timeout: Duration) -> bool {
        Instant::now().saturating_duration_since(self.last_seen()) > timeout
    }

    /// Unregister the metric if it has been idle for longer than `timeout`
    ///
    /// Returns true if this call withdrew the metric. The unlocked check keeps
    /// the sweeper off the lock for active sensors; the check is repeated under
    /// the lock because a concurrent `set` may have revived the metric in
    /// between.
    pub fn enforce_expiration(&self, timeout: Duration) -> bool {
        if !self.is_registered() || !self.has_expired(timeout) {
            return false;
        }

        debug!("[{}|{}] Locking to check expiration", self.sensor, self.field);
        let _guard = self.lock_value();

        if !self.is_registered() || !self.has_expired(timeout) {
            return false;
        }

        self.sink.unregister(&self.handle);
        self.registered.store(false, Ordering::Release);
        info!("[{}|{}] Unregistered metric due to timeout", self.sensor, self.field);
        true
    }

    /// Last value set (kept after expiry)
    pub fn value(&self) -> f64 {
        *self.lock_value()
    }

    /// Time of the last `set`, or creation time if never set
    pub fn last_seen(&self) -> Instant {
        self.origin + Duration::from_nanos(self.last_seen.load(Ordering::Acquire))
    }

    /// Whether the sink currently exposes this metric
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    pub fn sensor(&self) -> &SensorIdentity {
        &self.sensor
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    pub fn handle(&self) -> &S::Handle {
        &self.handle
    }

    fn friendly_name(&self) -> &str {
        self.descriptor
            .labels
            .get("name")
            .map(String::as_str)
            .unwrap_or(&self.sensor.id)
    }

    /// Must be called with the value lock held
    fn touch(&self) {
        let elapsed = Instant::now().saturating_duration_since(self.origin);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.last_seen.store(nanos, Ordering::Release);
    }

    fn lock_value(&self) -> MutexGuard<'_, f64> {
        // Recover from a poisoned mutex - the value is a plain f64 and still valid
        self.value.lock().unwrap_or_else(|poisoned| {
            warn!("[{}|{}] Metric mutex was poisoned, recovering", self.sensor, self.field);
            poisoned.into_inner()
        })
    }
}
