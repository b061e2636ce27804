//! Message parser for RFLink lines
//!
//! A line looks like `20;1A;Oregon TempHygro;ID=1234;TEMP=010a;BAT=OK;`:
//! two header fields, the vendor name, `KEY=VALUE` fields, and a trailing
//! terminator that is ignored. Only a line with fewer than three fields is
//! rejected as a whole; every other problem drops a single field.

use crate::decoder::{decode, DecodeError};
use log::warn;
use rflink_prom_types::{rflink_schema, FieldKind, FieldSchema, SensorIdentity, ID_FIELD};
use std::collections::BTreeMap;
use thiserror::Error;

/// Index of the vendor name in a line
const VENDOR_INDEX: usize = 2;

/// Errors that discard a whole message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed message: {0} fields, at least 3 required")]
    TooFewFields(usize),
}

/// A field that was skipped while the rest of the message was kept
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field without value at index {index}: {field}")]
    MissingEquals { index: usize, field: String },
    #[error("unknown field {0}")]
    UnknownField(String),
    #[error("malformed field {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },
}

/// Result of parsing one line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    pub sensor: SensorIdentity,
    /// Lowercased field name -> decoded value (last occurrence wins)
    pub readings: BTreeMap<String, f64>,
    /// Fields dropped from this message
    pub skipped: Vec<FieldError>,
}

/// Parse a line against the RFLink schema
pub fn parse_message(line: &str) -> Result<ParsedMessage, ParseError> {
    parse_message_with(rflink_schema(), line)
}

/// Parse a line against an explicit schema
pub fn parse_message_with(schema: &FieldSchema, line: &str) -> Result<ParsedMessage, ParseError> {
    let fields: Vec<&str> = line.split(';').collect();
    let vendor = match fields.get(VENDOR_INDEX) {
        Some(vendor) => *vendor,
        None => return Err(ParseError::TooFewFields(fields.len())),
    };

    let mut id = String::new();
    let mut readings = BTreeMap::new();
    let mut skipped = Vec::new();

    // The last field is the terminator
    let candidates = fields
        .iter()
        .enumerate()
        .take(fields.len() - 1)
        .skip(VENDOR_INDEX + 1);

    for (index, field) in candidates {
        match parse_field(schema, index, field) {
            Ok(Some(Field::Id(value))) => id = value,
            Ok(Some(Field::Reading(name, value))) => {
                readings.insert(name, value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping field in message from {}: {}", vendor, e);
                skipped.push(e);
            }
        }
    }

    Ok(ParsedMessage {
        sensor: SensorIdentity::new(vendor, id),
        readings,
        skipped,
    })
}

enum Field {
    Id(String),
    Reading(String, f64),
}

fn parse_field(
    schema: &FieldSchema,
    index: usize,
    field: &str,
) -> Result<Option<Field>, FieldError> {
    let (key, value) = field.split_once('=').ok_or_else(|| FieldError::MissingEquals {
        index,
        field: field.to_string(),
    })?;

    let kind = schema
        .kind_of(key)
        .ok_or_else(|| FieldError::UnknownField(key.to_string()))?;

    if !kind.is_numeric() {
        // Text fields other than the id have nothing to expose
        if key == ID_FIELD {
            return Ok(Some(Field::Id(value.to_lowercase())));
        }
        return Ok(None);
    }

    let decoded = decode(value, kind).map_err(|source| FieldError::Decode {
        key: key.to_string(),
        source,
    })?;
    Ok(Some(Field::Reading(key.to_lowercase(), decoded)))
}
