//! Compiled-in RFLink field table
//!
//! Based on the RFLink protocol reference (<http://www.rflink.nl/blog2/protref>).
//! Keys are matched case-sensitively against the `KEY` part of `KEY=VALUE` tokens.

use crate::field::FieldKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Field key carrying the sensor id
pub const ID_FIELD: &str = "ID";

/// Every field the exporter understands, with its decoding rule
pub const FIELD_TABLE: &[(&str, FieldKind)] = &[
    // Device ID (often a rolling code and/or device channel number)
    ("ID", FieldKind::Text),
    // Average wind speed, km/h
    ("AWINSP", FieldKind::HexDiv10),
    // Barometric pressure
    ("BARO", FieldKind::Hex),
    ("BAT", FieldKind::Battery),
    // 0=unknown, 1=sunny, 2=partly cloudy, 3=cloudy, 4=rain
    ("BFORECAST", FieldKind::Hex),
    // Doorbell melody number
    ("CHIME", FieldKind::Hex),
    ("CMD", FieldKind::Text),
    ("CO2", FieldKind::Int),
    ("CURRENT", FieldKind::Int),
    ("CURRENT2", FieldKind::Int),
    ("CURRENT3", FieldKind::Int),
    ("DIST", FieldKind::Int),
    // 0=normal, 1=comfortable, 2=dry, 3=wet
    ("HSTATUS", FieldKind::Int),
    // Relative humidity, 0-100
    ("HUM", FieldKind::Int),
    ("KWATT", FieldKind::Hex),
    ("LUX", FieldKind::Hex),
    ("METER", FieldKind::Int),
    ("PIR", FieldKind::OnOff),
    // Total rain, mm
    ("RAIN", FieldKind::HexDiv10),
    ("RAINRATE", FieldKind::HexDiv10),
    ("RGBW", FieldKind::Text),
    // Dimming level, 0-15
    ("SET_LEVEL", FieldKind::Int),
    ("SMOKEALERT", FieldKind::OnOff),
    ("SOUND", FieldKind::Int),
    // House/unit code like A1, P2, B16
    ("SWITCH", FieldKind::Text),
    // Celsius, high bit is the sign (0x80DC = -22.0)
    ("TEMP", FieldKind::Temp),
    ("UV", FieldKind::Hex),
    ("VOLT", FieldKind::Int),
    ("WATT", FieldKind::Int),
    ("WINCHL", FieldKind::Temp),
    // 0-15, in 22.5 degree steps
    ("WINDIR", FieldKind::Int),
    // Wind gust, km/h
    ("WINGS", FieldKind::Hex),
    ("WINSP", FieldKind::HexDiv10),
    ("WINTMP", FieldKind::Temp),
];

/// Read-only mapping from protocol field key to [`FieldKind`]
#[derive(Debug, Clone)]
pub struct FieldSchema {
    kinds: HashMap<&'static str, FieldKind>,
}

impl FieldSchema {
    /// Build a schema from a static table
    pub fn from_table(table: &'static [(&'static str, FieldKind)]) -> Self {
        Self {
            kinds: table.iter().copied().collect(),
        }
    }

    /// Look up the kind of a field key
    pub fn kind_of(&self, key: &str) -> Option<FieldKind> {
        self.kinds.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterate over all known keys (unordered)
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }
}

/// The RFLink schema, built once on first use
static RFLINK_SCHEMA: Lazy<FieldSchema> = Lazy::new(|| FieldSchema::from_table(FIELD_TABLE));

/// Get the shared RFLink schema
pub fn rflink_schema() -> &'static FieldSchema {
    &RFLINK_SCHEMA
}
