//! Field-level decoding for the backend's loosely typed payloads.
//!
//! Numbers may arrive as strings, ids as numbers, fractional values where a
//! count is expected. Each helper reads one field; a field that still cannot
//! be read falls back to its default without failing the record around it.
//! The `Value` readers serve hand-written decoders, the `Deserializer`
//! adapters plug into `#[serde(deserialize_with = "...")]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Non-negative number rounded to the nearest integer.
pub fn count(value: &Value) -> Option<u64> {
    number(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u64)
}

/// Strings as is, numbers in their decimal form.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        _ => None,
    }
}

/// Decodes each array element on its own, dropping the ones that fail.
pub fn list<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    let Value::Array(entries) = value else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match T::deserialize(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!("dropping malformed element: {}", e);
                None
            }
        })
        .collect()
}

pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number(&Value::deserialize(d)?).unwrap_or_default())
}

pub fn float_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(number(&Value::deserialize(d)?))
}

pub fn uint<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(uint_opt(d)?.unwrap_or_default())
}

pub fn uint_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(count(&Value::deserialize(d)?).and_then(|n| u32::try_from(n).ok()))
}

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text(&Value::deserialize(d)?).unwrap_or_default())
}

pub fn string_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text(&Value::deserialize(d)?))
}

pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(flag(&Value::deserialize(d)?).unwrap_or_default())
}

pub fn items<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(list(&Value::deserialize(d)?))
}

/// Any field type, falling back to `T::default()` when it does not decode.
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(T::deserialize(Value::deserialize(d)?).unwrap_or_default())
}
