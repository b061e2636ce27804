//! rflink-prom: Prometheus exporter for RFLink radio bridges
//!
//! This library provides the service around the protocol core:
//! - Configuration and the sensor id -> name mapping
//! - The serial line transport
//! - Ingestion of lines into the sensor registry and periodic expiry
//! - The Prometheus sink and `/metrics` endpoint

pub mod config;
pub mod core;
pub mod exporter;
pub mod sources;

// Re-export commonly used types
pub use config::{AppConfig, NameMap, Settings};
pub use core::{ExpirationSweeper, Ingestor};
pub use exporter::PrometheusSink;
