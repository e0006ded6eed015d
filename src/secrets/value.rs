//! Secret-or-plain string at the REST boundary.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::FieldValue;
use crate::error::PropertyError;
use crate::property::PropertyValue;

/// A string that may be secret.
///
/// On the wire a plain value is a bare string, a secret being sent is
/// `{"secret": "<plaintext>"}`, and a secret returned by the service is
/// `{"ciphertext": "<ciphertext>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretValue {
    /// Plaintext, or ciphertext when read back from the service.
    pub value: String,
    /// Whether the value is secret.
    pub secret: bool,
}

impl SecretValue {
    /// A non-secret value.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: false,
        }
    }

    /// A secret value.
    #[must_use]
    pub fn secret(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: true,
        }
    }
}

impl FieldValue for SecretValue {
    const KIND: &'static str = "string";

    fn to_property(&self) -> PropertyValue {
        if self.secret {
            PropertyValue::secret(self.value.as_str())
        } else {
            PropertyValue::from(self.value.as_str())
        }
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        match (value, value.unwrap_secret()) {
            (PropertyValue::Secret(_), PropertyValue::String(s)) => Ok(Self::secret(s.as_str())),
            (_, PropertyValue::String(s)) => Ok(Self::plain(s.as_str())),
            (_, other) => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
        }
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.secret {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("secret", &self.value)?;
            map.end()
        } else {
            serializer.serialize_str(&self.value)
        }
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SecretValueVisitor)
    }
}

struct SecretValueVisitor;

impl<'de> Visitor<'de> for SecretValueVisitor {
    type Value = SecretValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or an object with a `secret` or `ciphertext` member")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<SecretValue, E> {
        Ok(SecretValue::plain(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<SecretValue, A::Error> {
        let mut found = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "secret" | "ciphertext" => found = Some(map.next_value::<String>()?),
                _ => {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
        }
        found
            .map(SecretValue::secret)
            .ok_or_else(|| de::Error::missing_field("secret"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_is_a_bare_string() {
        let encoded = serde_json::to_value(SecretValue::plain("us-west-2")).expect("encode");
        assert_eq!(encoded, json!("us-west-2"));
    }

    #[test]
    fn test_secret_is_wrapped() {
        let encoded = serde_json::to_value(SecretValue::secret("hunter2")).expect("encode");
        assert_eq!(encoded, json!({ "secret": "hunter2" }));
    }

    #[test]
    fn test_property_form_tracks_secrecy() {
        let secret = SecretValue::secret("pw");
        assert_eq!(secret.to_property(), PropertyValue::secret("pw"));
        assert_eq!(
            SecretValue::from_property("env", &PropertyValue::secret("pw")).expect("decode"),
            secret
        );
        assert_eq!(
            SecretValue::from_property("env", &PropertyValue::from("x")).expect("decode"),
            SecretValue::plain("x")
        );
    }

    #[test]
    fn test_ciphertext_reads_as_secret() {
        let decoded: SecretValue =
            serde_json::from_value(json!({ "ciphertext": "AAAAbase64" })).expect("decode");
        assert_eq!(decoded, SecretValue::secret("AAAAbase64"));
    }
}
