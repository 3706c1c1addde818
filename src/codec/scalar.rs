//! Scalar payloads and map key text
//!
//! Non-finite floats travel as the strings `NaN`, `Infinity` and `-Infinity`.
//! Dates travel as RFC 3339 text in UTC.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value as JsonValue};

use super::tag::TypeTag;
use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::value::{ElementKind, Value};
use crate::version::Version;

/// Token standing for a null map key
pub const NULL_KEY: &str = "null";

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

fn float_payload(value: f64) -> JsonValue {
    match Number::from_f64(value) {
        Some(number) => JsonValue::Number(number),
        None => JsonValue::String(non_finite_text(value).to_string()),
    }
}

fn non_finite_text(value: f64) -> &'static str {
    if value.is_nan() {
        NAN
    } else if value > 0.0 {
        INFINITY
    } else {
        NEG_INFINITY
    }
}

fn parse_non_finite(text: &str) -> Option<f64> {
    match text {
        NAN => Some(f64::NAN),
        INFINITY => Some(f64::INFINITY),
        NEG_INFINITY => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn date_text(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_date(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| MetadataError::parse(format!("invalid date {:?}: {}", text, e)))
}

fn parse_char(text: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(MetadataError::parse(format!(
            "expected a single character, got {:?}",
            text
        ))),
    }
}

fn parse_key(text: &str) -> Result<Key<Value>> {
    Key::of(text).map_err(|e| MetadataError::parse(format!("invalid key {:?}: {}", text, e)))
}

/// Payload of a comparable single value
pub(super) fn encode(value: &Value) -> Result<JsonValue> {
    Ok(match value {
        Value::String(v) => JsonValue::String(v.clone()),
        Value::Char(v) => JsonValue::String(v.to_string()),
        Value::Bool(v) => JsonValue::Bool(*v),
        Value::Byte(v) => JsonValue::from(*v),
        Value::Short(v) => JsonValue::from(*v),
        Value::Int(v) => JsonValue::from(*v),
        Value::Long(v) => JsonValue::from(*v),
        Value::Float(v) => float_payload(f64::from(*v)),
        Value::Double(v) => float_payload(*v),
        Value::Date(v) => JsonValue::String(date_text(v)),
        Value::Key(v) => JsonValue::String(v.id().to_string()),
        Value::Version(v) => JsonValue::String(v.to_string()),
        other => {
            return Err(MetadataError::Unsupported(format!(
                "{} is not a scalar",
                other.type_name()
            )))
        }
    })
}

fn expect_str<'a>(kind: ElementKind, payload: &'a JsonValue) -> Result<&'a str> {
    payload.as_str().ok_or_else(|| {
        MetadataError::parse(format!("{} payload must be a string, got {}", kind.name(), payload))
    })
}

fn expect_integer<T: TryFrom<i64>>(kind: ElementKind, payload: &JsonValue) -> Result<T> {
    payload
        .as_i64()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| {
            MetadataError::parse(format!("{} payload out of range: {}", kind.name(), payload))
        })
}

fn expect_float(kind: ElementKind, payload: &JsonValue) -> Result<f64> {
    match payload {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => parse_non_finite(text),
        _ => None,
    }
    .ok_or_else(|| MetadataError::parse(format!("invalid {} payload: {}", kind.name(), payload)))
}

/// Rebuild a comparable single value from its payload
pub(super) fn decode(kind: ElementKind, payload: &JsonValue) -> Result<Value> {
    Ok(match kind {
        ElementKind::String => Value::String(expect_str(kind, payload)?.to_string()),
        ElementKind::Char => Value::Char(parse_char(expect_str(kind, payload)?)?),
        ElementKind::Bool => Value::Bool(payload.as_bool().ok_or_else(|| {
            MetadataError::parse(format!("Boolean payload must be true or false, got {}", payload))
        })?),
        ElementKind::Byte => Value::Byte(expect_integer(kind, payload)?),
        ElementKind::Short => Value::Short(expect_integer(kind, payload)?),
        ElementKind::Int => Value::Int(expect_integer(kind, payload)?),
        ElementKind::Long => Value::Long(expect_integer(kind, payload)?),
        ElementKind::Float => Value::Float(expect_float(kind, payload)? as f32),
        ElementKind::Double => Value::Double(expect_float(kind, payload)?),
        ElementKind::Date => Value::Date(parse_date(expect_str(kind, payload)?)?),
        ElementKind::Key => Value::Key(parse_key(expect_str(kind, payload)?)?),
        ElementKind::Version => Value::Version(Version::parse(expect_str(kind, payload)?)?),
        ElementKind::Metadata | ElementKind::Proxy => {
            return Err(MetadataError::parse(format!("{} is not a scalar", kind.name())))
        }
    })
}

/// Text form of a map key
pub(crate) fn key_text(key: &Value) -> Result<String> {
    Ok(match key {
        Value::Null => NULL_KEY.to_string(),
        Value::Float(v) if !v.is_finite() => non_finite_text(f64::from(*v)).to_string(),
        Value::Double(v) if !v.is_finite() => non_finite_text(*v).to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        other => match encode(other)? {
            JsonValue::String(text) => text,
            payload => payload.to_string(),
        },
    })
}

/// Rebuild a map key from its text form and declared tag
pub(super) fn parse_key_text(tag: TypeTag, text: &str) -> Result<Value> {
    let kind = match tag {
        TypeTag::Null if text == NULL_KEY => return Ok(Value::Null),
        TypeTag::Single(kind) if kind.is_comparable() => kind,
        _ => {
            return Err(MetadataError::parse(format!(
                "{:?} cannot be read as a {} map key",
                text, tag
            )))
        }
    };
    let invalid = |e: &dyn std::fmt::Display| {
        MetadataError::parse(format!("invalid {} map key {:?}: {}", kind.name(), text, e))
    };
    Ok(match kind {
        ElementKind::Bool => Value::Bool(text.parse().map_err(|e| invalid(&e))?),
        ElementKind::Byte => Value::Byte(text.parse().map_err(|e| invalid(&e))?),
        ElementKind::Short => Value::Short(text.parse().map_err(|e| invalid(&e))?),
        ElementKind::Int => Value::Int(text.parse().map_err(|e| invalid(&e))?),
        ElementKind::Long => Value::Long(text.parse().map_err(|e| invalid(&e))?),
        ElementKind::Float => match parse_non_finite(text) {
            Some(v) => Value::Float(v as f32),
            None => Value::Float(text.parse().map_err(|e| invalid(&e))?),
        },
        ElementKind::Double => match parse_non_finite(text) {
            Some(v) => Value::Double(v),
            None => Value::Double(text.parse().map_err(|e| invalid(&e))?),
        },
        _ => decode(kind, &JsonValue::String(text.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn round_trip(value: Value) {
        let kind = value.element_kind().unwrap();
        let payload = encode(&value).unwrap();
        assert_eq!(decode(kind, &payload).unwrap(), value, "payload {}", payload);
    }

    #[test]
    fn test_scalar_payloads() {
        round_trip(Value::from("hello"));
        round_trip(Value::Char('λ'));
        round_trip(Value::Bool(false));
        round_trip(Value::Byte(-128));
        round_trip(Value::Short(i16::MAX));
        round_trip(Value::Int(-7));
        round_trip(Value::Long(i64::MIN));
        round_trip(Value::Float(0.1));
        round_trip(Value::Double(std::f64::consts::PI));
        round_trip(Value::Version(Version::new(2, 3)));
        round_trip(Value::Key(Key::of("a.b").unwrap()));
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(encode(&Value::Double(f64::NAN)).unwrap(), JsonValue::from("NaN"));
        round_trip(Value::Double(f64::NAN));
        round_trip(Value::Double(f64::NEG_INFINITY));
        round_trip(Value::Float(f32::INFINITY));
    }

    #[test]
    fn test_dates_keep_subsecond_precision() {
        let date = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let payload = encode(&Value::Date(date)).unwrap();
        assert_eq!(payload, JsonValue::from("2023-11-14T22:13:20.123456789Z"));
        round_trip(Value::Date(date));
    }

    #[test]
    fn test_out_of_range_integer() {
        let result = decode(ElementKind::Byte, &JsonValue::from(300));
        assert!(matches!(result, Err(MetadataError::Parse(_))));
    }

    #[test]
    fn test_char_payload_must_be_single() {
        assert!(decode(ElementKind::Char, &JsonValue::from("ab")).is_err());
        assert!(decode(ElementKind::Char, &JsonValue::from("")).is_err());
    }

    #[test]
    fn test_map_key_text() {
        let keys = vec![
            Value::Null,
            Value::from("null"),
            Value::Int(42),
            Value::Double(-0.5),
            Value::Double(f64::INFINITY),
            Value::Bool(true),
            Value::Char('x'),
            Value::Version(Version::new(1, 9)),
        ];
        for key in keys {
            let text = key_text(&key).unwrap();
            let tag = TypeTag::of(&key);
            assert_eq!(parse_key_text(tag, &text).unwrap(), key, "text {:?}", text);
        }
    }

    #[test]
    fn test_map_key_rejects_mismatched_text() {
        assert!(parse_key_text(TypeTag::Single(ElementKind::Int), "x").is_err());
        assert!(parse_key_text(TypeTag::Null, "nil").is_err());
        assert!(parse_key_text(TypeTag::List, "[]").is_err());
    }
}
