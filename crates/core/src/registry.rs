//! Registry of every metric ever created, keyed by sensor then field
//!
//! Entries are never removed. Expired metrics stay in the registry,
//! unregistered from the sink, so the next reading for the same sensor and
//! field revives the same [`Metric`] instead of creating a second one.

use crate::metric::Metric;
use crate::sink::ExpositionSink;
use log::{debug, warn};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Field name -> metric
type FieldMap<S> = HashMap<String, Arc<Metric<S>>>;

/// Two-level store: sensor key (`"<vendor> <id>"`) -> field name -> metric
pub struct Registry<S: ExpositionSink> {
    sensors: RwLock<HashMap<String, FieldMap<S>>>,
}

impl<S: ExpositionSink> Registry<S> {
    pub fn new() -> Self {
        Self {
            sensors: RwLock::new(HashMap::new()),
        }
    }

    /// Get the metric for `(sensor_key, field)`, creating it with `create` if absent
    pub fn get_or_create<F>(&self, sensor_key: &str, field: &str, create: F) -> Arc<Metric<S>>
    where
        F: FnOnce() -> Metric<S>,
    {
        match self.get_or_try_create(sensor_key, field, || Ok::<_, Infallible>(create())) {
            Ok(metric) => metric,
            Err(never) => match never {},
        }
    }

    /// Like [`get_or_create`](Self::get_or_create) with a fallible constructor
    ///
    /// `create` runs at most once per key, under the write lock, so no second
    /// `Metric` is ever built for a key even when callers race.
    pub fn get_or_try_create<F, E>(
        &self,
        sensor_key: &str,
        field: &str,
        create: F,
    ) -> Result<Arc<Metric<S>>, E>
    where
        F: FnOnce() -> Result<Metric<S>, E>,
    {
        // Fast path: quick read lock
        if let Some(metric) = self.get(sensor_key, field) {
            return Ok(metric);
        }

        let mut sensors = self.write();
        // Re-check: another caller may have inserted it after our read
        if let Some(metric) = sensors.get(sensor_key).and_then(|fields| fields.get(field)) {
            return Ok(Arc::clone(metric));
        }

        let metric = Arc::new(create()?);
        sensors
            .entry(sensor_key.to_string())
            .or_default()
            .insert(field.to_string(), Arc::clone(&metric));
        debug!(
            "Created metric for sensor '{}' field {} ({} sensors known)",
            sensor_key,
            field,
            sensors.len()
        );
        Ok(metric)
    }

    /// Look up an existing metric without creating it
    pub fn get(&self, sensor_key: &str, field: &str) -> Option<Arc<Metric<S>>> {
        self.read()
            .get(sensor_key)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    /// Snapshot of every known metric
    ///
    /// The registry lock is released before the caller touches any metric.
    pub fn metrics(&self) -> Vec<Arc<Metric<S>>> {
        self.read()
            .values()
            .flat_map(|fields| fields.values().cloned())
            .collect()
    }

    /// Withdraw every metric idle for longer than `timeout`
    ///
    /// Returns how many metrics were unregistered by this pass.
    pub fn enforce_expiration(&self, timeout: Duration) -> usize {
        self.metrics()
            .iter()
            .filter(|metric| metric.enforce_expiration(timeout))
            .count()
    }

    /// Number of distinct sensor keys
    pub fn sensor_count(&self) -> usize {
        self.read().len()
    }

    /// Number of metrics across all sensors
    pub fn metric_count(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    /// Number of metrics currently exposed by the sink
    pub fn registered_count(&self) -> usize {
        self.metrics().iter().filter(|m| m.is_registered()).count()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, FieldMap<S>>> {
        // The map itself is never left half-updated, so a poisoned lock is still usable
        self.sensors.read().unwrap_or_else(|poisoned| {
            warn!("Registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, FieldMap<S>>> {
        self.sensors.write().unwrap_or_else(|poisoned| {
            warn!("Registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl<S: ExpositionSink> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MetricDescriptor, SinkError};
    use crate::test_support::RecordingSink;
    use rflink_prom_types::SensorIdentity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(60);

    fn new_metric(
        sink: &Arc<RecordingSink>,
        vendor: &str,
        id: &str,
        field: &str,
    ) -> Metric<RecordingSink> {
        let sensor = SensorIdentity::new(vendor, id);
        let desc = MetricDescriptor::for_reading(&sensor, field, id);
        Metric::new(sensor, field, desc, Arc::clone(sink)).unwrap()
    }

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let sink = Arc::new(RecordingSink::default());
        let registry = Registry::new();

        let first = registry.get_or_create("Oregon abcd", "temp", || {
            new_metric(&sink, "Oregon", "abcd", "temp")
        });
        let second = registry.get_or_create("Oregon abcd", "temp", || {
            panic!("constructor must not run for an existing key")
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.metric_count(), 1);
        assert_eq!(sink.described(), 1);
    }

    #[test]
    fn test_two_level_keys() {
        let sink = Arc::new(RecordingSink::default());
        let registry = Registry::new();

        registry.get_or_create("Oregon abcd", "temp", || {
            new_metric(&sink, "Oregon", "abcd", "temp")
        });
        registry.get_or_create("Oregon abcd", "hum", || new_metric(&sink, "Oregon", "abcd", "hum"));
        registry.get_or_create("Oregon ", "temp", || new_metric(&sink, "Oregon", "", "temp"));

        assert_eq!(registry.sensor_count(), 2);
        assert_eq!(registry.metric_count(), 3);
        assert!(registry.get("Oregon abcd", "hum").is_some());
        assert!(registry.get("Oregon abcd", "bat").is_none());
        assert!(registry.get("Oregon ", "temp").is_some());
    }

    #[test]
    fn test_failed_constructor_inserts_nothing() {
        let registry: Registry<RecordingSink> = Registry::new();

        let result = registry.get_or_try_create("Oregon abcd", "temp", || {
            Err(SinkError::InvalidMetric {
                name: "rflink_temp".to_string(),
                reason: "test".to_string(),
            })
        });

        assert!(result.is_err());
        assert!(registry.get("Oregon abcd", "temp").is_none());
        assert_eq!(registry.sensor_count(), 0);
    }

    #[test]
    fn test_concurrent_creation_builds_one_metric() {
        let sink = Arc::new(RecordingSink::default());
        let registry = Arc::new(Registry::new());
        let constructed = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let sink = Arc::clone(&sink);
                let registry = Arc::clone(&registry);
                let constructed = Arc::clone(&constructed);
                std::thread::spawn(move || {
                    registry.get_or_create("Oregon abcd", "temp", || {
                        constructed.fetch_add(1, Ordering::SeqCst);
                        new_metric(&sink, "Oregon", "abcd", "temp")
                    })
                })
            })
            .collect();

        let metrics: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert!(metrics.iter().all(|m| Arc::ptr_eq(m, &metrics[0])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enforce_expiration_only_touches_idle_metrics() {
        let sink = Arc::new(RecordingSink::default());
        let registry = Registry::new();

        let stale = registry.get_or_create("Oregon abcd", "temp", || {
            new_metric(&sink, "Oregon", "abcd", "temp")
        });
        stale.set(20.0);

        tokio::time::advance(TIMEOUT / 2).await;
        let fresh = registry.get_or_create("Oregon beef", "temp", || {
            new_metric(&sink, "Oregon", "beef", "temp")
        });
        fresh.set(21.0);

        tokio::time::advance(TIMEOUT / 2 + Duration::from_secs(1)).await;
        assert_eq!(registry.enforce_expiration(TIMEOUT), 1);
        assert!(!stale.is_registered());
        assert!(fresh.is_registered());
        assert_eq!(registry.registered_count(), 1);

        // Soft deletion: the entry is still there
        assert_eq!(registry.metric_count(), 2);
        assert_eq!(registry.enforce_expiration(TIMEOUT), 0);
    }
}
