//! JSON wire encoding of property values.
//!
//! Scalars, arrays and objects map directly onto JSON. Secrets and assets are
//! encoded as marker objects keyed by [`SIG_KEY`]; unknowns are a sentinel
//! string.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::PropertyError;

use super::value::{PropertyMap, PropertyValue};

/// Key identifying a special marker object.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// Signature of a secret marker.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";

/// Signature of an asset marker.
pub const ASSET_SIG: &str = "c44067f5952c0a294b673a41bacd8c17";

/// Sentinel string standing for an unknown value.
pub const UNKNOWN_SENTINEL: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// Encodes a property value as JSON.
#[must_use]
pub fn to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        // NaN and infinities have no JSON form.
        PropertyValue::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        PropertyValue::Object(map) => Value::Object(to_json_map(map)),
        PropertyValue::Asset(text) => {
            let mut marker = Map::new();
            marker.insert(SIG_KEY.to_string(), Value::from(ASSET_SIG));
            marker.insert("text".to_string(), Value::from(text.as_str()));
            Value::Object(marker)
        }
        PropertyValue::Secret(inner) => {
            let mut marker = Map::new();
            marker.insert(SIG_KEY.to_string(), Value::from(SECRET_SIG));
            marker.insert("value".to_string(), to_json(inner));
            Value::Object(marker)
        }
        PropertyValue::Unknown => Value::from(UNKNOWN_SENTINEL),
    }
}

/// Encodes a property map as a JSON object.
#[must_use]
pub fn to_json_map(map: &PropertyMap) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect()
}

/// Decodes a JSON value into a property value.
///
/// # Errors
///
/// Returns an error if a marker object is malformed or has an unknown signature.
pub fn from_json(value: &Value) -> Result<PropertyValue, PropertyError> {
    Ok(match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Number(n) => PropertyValue::Number(n.as_f64().ok_or_else(|| invalid(format!("number {n} out of range")))?),
        Value::String(s) if s == UNKNOWN_SENTINEL => PropertyValue::Unknown,
        Value::String(s) => PropertyValue::String(s.clone()),
        Value::Array(items) => PropertyValue::Array(items.iter().map(from_json).collect::<Result<_, _>>()?),
        Value::Object(obj) => match obj.get(SIG_KEY) {
            None => PropertyValue::Object(from_json_map(obj)?),
            Some(sig) => from_marker(sig, obj)?,
        },
    })
}

/// Decodes a JSON object into a property map.
///
/// # Errors
///
/// Returns an error if any member fails to decode.
pub fn from_json_map(obj: &Map<String, Value>) -> Result<PropertyMap, PropertyError> {
    obj.iter()
        .map(|(k, v)| Ok((k.clone(), from_json(v)?)))
        .collect()
}

/// Encodes a property value as plain JSON for the REST API: secrets are
/// unwrapped, assets become their text and unknowns become null.
#[must_use]
pub fn to_plain_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null | PropertyValue::Unknown => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        PropertyValue::String(s) | PropertyValue::Asset(s) => Value::String(s.clone()),
        PropertyValue::Array(items) => Value::Array(items.iter().map(to_plain_json).collect()),
        PropertyValue::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_plain_json(v))).collect(),
        ),
        PropertyValue::Secret(inner) => to_plain_json(inner),
    }
}

/// Reads plain JSON from the REST API. Marker objects are not interpreted.
#[must_use]
pub fn from_plain_json(value: &Value) -> PropertyValue {
    match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(PropertyValue::Null, PropertyValue::Number),
        Value::String(s) => PropertyValue::String(s.clone()),
        Value::Array(items) => PropertyValue::Array(items.iter().map(from_plain_json).collect()),
        Value::Object(obj) => PropertyValue::Object(
            obj.iter().map(|(k, v)| (k.clone(), from_plain_json(v))).collect(),
        ),
    }
}

fn from_marker(sig: &Value, obj: &Map<String, Value>) -> Result<PropertyValue, PropertyError> {
    match sig.as_str() {
        Some(SECRET_SIG) => {
            let inner = obj
                .get("value")
                .ok_or_else(|| invalid("secret marker without a value"))?;
            Ok(PropertyValue::secret(from_json(inner)?))
        }
        Some(ASSET_SIG) => obj
            .get("text")
            .and_then(Value::as_str)
            .map(|text| PropertyValue::Asset(text.to_string()))
            .ok_or_else(|| invalid("only text assets are supported")),
        _ => Err(invalid(format!("unrecognized signature {sig}"))),
    }
}

fn invalid(message: impl Into<String>) -> PropertyError {
    PropertyError::InvalidWireValue {
        message: message.into(),
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        from_json(&value).map_err(D::Error::custom)
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json_map(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let obj = Map::<String, Value>::deserialize(deserializer)?;
        from_json_map(&obj).map_err(D::Error::custom)
    }
}
