//! rflink-prom-core: Protocol decoding and sensor registry for rflink-prom.
//!
//! This crate contains the value decoder, the message parser, the
//! [`ExpositionSink`] seam and the [`Registry`] of per-sensor metrics with
//! their create/update/expire lifecycle. It knows nothing about serial ports,
//! HTTP or Prometheus.

pub mod constants;
mod decoder;
mod metric;
mod parser;
mod registry;
mod sink;

#[cfg(test)]
mod test_support;

pub use constants::{sweep_period, DEFAULT_TIMEOUT, MIN_SWEEP_PERIOD, NAMESPACE, SWEEPS_PER_TIMEOUT};
pub use decoder::{decode, decode_named, decode_temp, DecodeError};
pub use metric::Metric;
pub use parser::{parse_message, parse_message_with, FieldError, ParseError, ParsedMessage};
pub use registry::Registry;
pub use sink::{resolve_name, ExpositionSink, Labels, MetricDescriptor, NameLookup, SinkError};

// Re-export types used in public signatures for convenience
pub use rflink_prom_types::{FieldKind, FieldSchema, SensorIdentity};
