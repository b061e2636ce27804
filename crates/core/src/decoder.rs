//! Value decoder: raw protocol token + field kind -> number

use rflink_prom_types::FieldKind;
use thiserror::Error;

/// Why a single token could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown value '{token}' for kind {kind}")]
    UnknownToken { token: String, kind: FieldKind },
    #[error("couldn't parse hex value '{0}'")]
    InvalidHex(String),
    #[error("couldn't parse integer value '{0}'")]
    InvalidInt(String),
    #[error("couldn't parse temperature '{0}': value must be exactly 4 hex characters")]
    BadLength(String),
    #[error("unknown kind {0}")]
    UnknownKind(String),
}

/// Decode `token` according to `kind`
///
/// [`FieldKind::Text`] carries no numeric value and is reported as
/// [`DecodeError::UnknownKind`].
pub fn decode(token: &str, kind: FieldKind) -> Result<f64, DecodeError> {
    match kind {
        FieldKind::Battery => match token {
            "OK" => Ok(1.0),
            "LOW" => Ok(0.0),
            _ => Err(unknown_token(token, kind)),
        },
        FieldKind::OnOff => match token {
            "ON" => Ok(1.0),
            "OFF" => Ok(0.0),
            _ => Err(unknown_token(token, kind)),
        },
        FieldKind::Hex => parse_u16(token, 16)
            .map(f64::from)
            .ok_or_else(|| DecodeError::InvalidHex(token.to_string())),
        FieldKind::HexDiv10 => parse_u16(token, 16)
            .map(|v| f64::from(v) / 10.0)
            .ok_or_else(|| DecodeError::InvalidHex(token.to_string())),
        FieldKind::Int => parse_u16(token, 10)
            .map(f64::from)
            .ok_or_else(|| DecodeError::InvalidInt(token.to_string())),
        FieldKind::Temp => decode_temp(token),
        FieldKind::Text => Err(DecodeError::UnknownKind(kind.name().to_string())),
    }
}

/// Decode `token` using a kind given by name (`"temp"`, `"hex_div10"`, ...)
pub fn decode_named(token: &str, kind_name: &str) -> Result<f64, DecodeError> {
    let kind = kind_name
        .parse::<FieldKind>()
        .map_err(|e| DecodeError::UnknownKind(e.0))?;
    decode(token, kind)
}

/// Temperatures are 2-byte hex strings, eg. `TEMP=010a`
///
/// ```text
/// 0x010a -> 0000 0001 0000 1010
///           |\                /
///           | value on 15 bits, in tenths (266 -> 26.6)
///           sign (1 = negative)
/// ```
pub fn decode_temp(token: &str) -> Result<f64, DecodeError> {
    if token.len() != 4 {
        return Err(DecodeError::BadLength(token.to_string()));
    }
    let raw = parse_u16(token, 16).ok_or_else(|| DecodeError::InvalidHex(token.to_string()))?;

    let magnitude = raw & 0x7FFF;
    if magnitude == 0 {
        // 0x8000 would otherwise give -0.0
        return Ok(0.0);
    }
    let value = f64::from(magnitude) / 10.0;
    if raw & 0x8000 != 0 {
        Ok(-value)
    } else {
        Ok(value)
    }
}

fn unknown_token(token: &str, kind: FieldKind) -> DecodeError {
    DecodeError::UnknownToken {
        token: token.to_string(),
        kind,
    }
}

/// Unsigned 16-bit parse that rejects signs and surrounding whitespace
fn parse_u16(token: &str, radix: u32) -> Option<u16> {
    if token.is_empty() || !token.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u16::from_str_radix(token, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_temp_ok() {
        let cases = [
            ("010A", 26.6),
            ("7FFF", 3276.7),
            ("0000", 0.0),
            ("810A", -26.6),
            ("FFFF", -3276.7),
            ("010a", 26.6),
        ];
        for (input, expected) in cases {
            assert_eq!(decode(input, FieldKind::Temp), Ok(expected), "input {}", input);
        }
    }

    #[test]
    fn test_decode_temp_negative_zero_collapses() {
        let value = decode("8000", FieldKind::Temp).unwrap();
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
    }

    #[test]
    fn test_decode_temp_errors() {
        assert_eq!(
            decode("nope", FieldKind::Temp),
            Err(DecodeError::InvalidHex("nope".to_string()))
        );
        assert_eq!(
            decode("1AB", FieldKind::Temp),
            Err(DecodeError::BadLength("1AB".to_string()))
        );
        assert_eq!(
            decode("FFFFF", FieldKind::Temp),
            Err(DecodeError::BadLength("FFFFF".to_string()))
        );
        assert!(decode("+FFF", FieldKind::Temp).is_err());
    }

    #[test]
    fn test_decode_values_ok() {
        let cases = [
            ("OK", FieldKind::Battery, 1.0),
            ("LOW", FieldKind::Battery, 0.0),
            ("ON", FieldKind::OnOff, 1.0),
            ("OFF", FieldKind::OnOff, 0.0),
            ("012A", FieldKind::Hex, 298.0),
            ("ABCD", FieldKind::Hex, 43981.0),
            ("012A", FieldKind::HexDiv10, 29.8),
            ("ABCD", FieldKind::HexDiv10, 4398.1),
            ("123", FieldKind::Int, 123.0),
            ("0", FieldKind::Int, 0.0),
        ];
        for (input, kind, expected) in cases {
            assert_eq!(decode(input, kind), Ok(expected), "{} as {}", input, kind);
        }
    }

    #[test]
    fn test_decode_values_errors() {
        assert!(matches!(
            decode("KO", FieldKind::Battery),
            Err(DecodeError::UnknownToken { .. })
        ));
        assert!(matches!(
            decode("NO", FieldKind::OnOff),
            Err(DecodeError::UnknownToken { .. })
        ));
        assert!(matches!(decode("XYZ", FieldKind::Hex), Err(DecodeError::InvalidHex(_))));
        assert!(matches!(
            decode("XYZ", FieldKind::HexDiv10),
            Err(DecodeError::InvalidHex(_))
        ));
        assert!(matches!(decode("1A", FieldKind::Int), Err(DecodeError::InvalidInt(_))));
        assert!(matches!(
            decode("1234", FieldKind::Text),
            Err(DecodeError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_values_must_fit_in_16_bits() {
        assert!(decode("FFFF", FieldKind::Hex).is_ok());
        assert!(decode("10000", FieldKind::Hex).is_err());
        assert!(decode("FFFFFF", FieldKind::Hex).is_err());
        assert_eq!(decode("65535", FieldKind::Int), Ok(65535.0));
        assert!(decode("65536", FieldKind::Int).is_err());
    }

    #[test]
    fn test_signs_and_empty_tokens_rejected() {
        assert!(decode("", FieldKind::Int).is_err());
        assert!(decode("+12", FieldKind::Int).is_err());
        assert!(decode("-12", FieldKind::Int).is_err());
        assert!(decode("+1F", FieldKind::Hex).is_err());
    }

    #[test]
    fn test_decode_named() {
        assert_eq!(decode_named("010A", "temp"), Ok(26.6));
        assert_eq!(decode_named("012A", "hex_div10"), Ok(29.8));
        assert_eq!(
            decode_named("1234", "fake"),
            Err(DecodeError::UnknownKind("fake".to_string()))
        );
    }
}
