//! Field kinds describing how a raw protocol token is decoded

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decoding rule applied to the raw token of a protocol field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-form text (only `ID` is used, everything else is dropped)
    #[serde(rename = "string")]
    Text,
    /// `OK` / `LOW`
    Battery,
    /// `ON` / `OFF`
    #[serde(rename = "onoff")]
    OnOff,
    /// Unsigned 16-bit hexadecimal integer
    Hex,
    /// Unsigned 16-bit hexadecimal integer, in tenths
    HexDiv10,
    /// Unsigned 16-bit decimal integer
    Int,
    /// Sign-and-magnitude 16-bit hexadecimal value, in tenths
    Temp,
}

impl FieldKind {
    /// All kinds, in declaration order
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Text,
        FieldKind::Battery,
        FieldKind::OnOff,
        FieldKind::Hex,
        FieldKind::HexDiv10,
        FieldKind::Int,
        FieldKind::Temp,
    ];

    /// Stable lowercase name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Battery => "battery",
            FieldKind::OnOff => "onoff",
            FieldKind::Hex => "hex",
            FieldKind::HexDiv10 => "hex_div10",
            FieldKind::Int => "int",
            FieldKind::Temp => "temp",
        }
    }

    /// Whether values of this kind are exposed as numbers
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldKind::Text)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a kind name does not match any known [`FieldKind`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field kind '{0}'")]
pub struct UnknownKindName(pub String);

impl FromStr for FieldKind {
    type Err = UnknownKindName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownKindName(s.to_string()))
    }
}
