//! Sensor identity as seen on the wire

use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical device, identified by the vendor name and the `ID` field
///
/// `id` is already lowercased and may be empty when the message carried no
/// usable `ID` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorIdentity {
    pub vendor: String,
    pub id: String,
}

impl SensorIdentity {
    pub fn new(vendor: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            id: id.into(),
        }
    }

    /// Registry key: `"<vendor> <id>"`, kept even when `id` is empty
    pub fn key(&self) -> String {
        format!("{} {}", self.vendor, self.id)
    }

    /// Vendor as used in exposition labels: lowercased, spaces replaced by `_`
    pub fn vendor_label(&self) -> String {
        normalize_vendor(&self.vendor)
    }
}

impl fmt::Display for SensorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.vendor, self.id)
    }
}

/// Lowercase a vendor name and replace spaces with underscores
pub fn normalize_vendor(vendor: &str) -> String {
    vendor.to_lowercase().replace(' ', "_")
}
