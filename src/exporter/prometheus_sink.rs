//! Prometheus-backed exposition sink

use log::warn;
use prometheus::core::Collector;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use rflink_prom_core::{ExpositionSink, MetricDescriptor, SinkError};

/// Publishes sensor gauges in its own Prometheus registry
#[derive(Clone, Default)]
pub struct PrometheusSink {
    registry: Registry,
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render all registered gauges in the text exposition format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Content type of [`encode`](Self::encode) output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

fn gauge_name(gauge: &Gauge) -> String {
    gauge
        .desc()
        .first()
        .map(|desc| desc.fq_name.clone())
        .unwrap_or_default()
}

impl ExpositionSink for PrometheusSink {
    type Handle = Gauge;

    fn describe(&self, descriptor: &MetricDescriptor) -> Result<Gauge, SinkError> {
        let opts = Opts::new(descriptor.name.clone(), descriptor.help.clone())
            .namespace(descriptor.namespace.clone())
            .const_labels(descriptor.labels.clone().into_iter().collect());

        Gauge::with_opts(opts).map_err(|e| SinkError::InvalidMetric {
            name: descriptor.fq_name(),
            reason: e.to_string(),
        })
    }

    fn register(&self, handle: &Gauge) -> Result<(), SinkError> {
        self.registry
            .register(Box::new(handle.clone()))
            .map_err(|e| SinkError::Rejected {
                name: gauge_name(handle),
                reason: e.to_string(),
            })
    }

    fn unregister(&self, handle: &Gauge) {
        if let Err(e) = self.registry.unregister(Box::new(handle.clone())) {
            warn!("Cannot unregister gauge {}: {}", gauge_name(handle), e);
        }
    }

    fn set_value(&self, handle: &Gauge, value: f64) {
        handle.set(value);
    }
}
