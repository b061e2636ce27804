//! rflink-prom-types: Shared protocol types for the rflink-prom exporter.
//!
//! This crate contains pure data types (field kinds, the compiled-in field
//! schema, sensor identity) with no I/O, so both the core
//! and the service wiring can build on them.

pub mod field;
pub mod schema;
pub mod sensor;

// Re-export commonly used types at the crate root for convenience
pub use field::{FieldKind, UnknownKindName};
pub use schema::{rflink_schema, FieldSchema, FIELD_TABLE, ID_FIELD};
pub use sensor::{normalize_vendor, SensorIdentity};
