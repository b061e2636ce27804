//! Seams to the outside world: where metrics are published and where
//! friendly sensor names come from

use crate::constants::NAMESPACE;
use log::debug;
use rflink_prom_types::SensorIdentity;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Label name -> label value
pub type Labels = BTreeMap<String, String>;

/// Error reported by an [`ExpositionSink`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("invalid metric {name}: {reason}")]
    InvalidMetric { name: String, reason: String },
    #[error("registration of {name} rejected: {reason}")]
    Rejected { name: String, reason: String },
}

/// Everything the sink needs to expose one (sensor, field) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub namespace: String,
    /// Lowercased field name, also the metric's short name
    pub name: String,
    pub help: String,
    pub labels: Labels,
}

impl MetricDescriptor {
    /// Describe the metric for `field` of `sensor`, exposed under `friendly_name`
    ///
    /// Labels are `vendor` (normalized), `id`, `type` (the field) and `name`.
    pub fn for_reading(sensor: &SensorIdentity, field: &str, friendly_name: &str) -> Self {
        let mut labels = Labels::new();
        labels.insert("vendor".to_string(), sensor.vendor_label());
        labels.insert("id".to_string(), sensor.id.clone());
        labels.insert("type".to_string(), field.to_string());
        labels.insert("name".to_string(), friendly_name.to_string());

        Self {
            namespace: NAMESPACE.to_string(),
            name: field.to_string(),
            help: format!("RFLink {} reading", field),
            labels,
        }
    }

    /// `<namespace>_<name>`, eg. `rflink_temp`
    pub fn fq_name(&self) -> String {
        format!("{}_{}", self.namespace, self.name)
    }
}

/// The external system that publishes metric values
///
/// Handles are built once per metric with [`describe`](Self::describe) and
/// may be registered and unregistered any number of times.
pub trait ExpositionSink: Send + Sync {
    type Handle: Send + Sync;

    /// Build an unregistered handle for a metric
    fn describe(&self, descriptor: &MetricDescriptor) -> Result<Self::Handle, SinkError>;

    /// Start exposing a handle
    fn register(&self, handle: &Self::Handle) -> Result<(), SinkError>;

    /// Stop exposing a handle
    fn unregister(&self, handle: &Self::Handle);

    /// Update the exposed value
    fn set_value(&self, handle: &Self::Handle, value: f64);
}

/// Source of friendly names for sensor ids
pub trait NameLookup: Send + Sync {
    fn lookup(&self, id: &str) -> Option<String>;
}

impl NameLookup for HashMap<String, String> {
    fn lookup(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

/// Friendly name for `id`, falling back to the id itself
pub fn resolve_name(names: &dyn NameLookup, id: &str) -> String {
    match names.lookup(id) {
        Some(name) => {
            debug!("Mapping for sensor ID {} -> {}", id, name);
            name
        }
        None => {
            debug!("No name mapping for sensor ID {}", id);
            id.to_string()
        }
    }
}
