//! [`FieldValue`] implementations for the supported field kinds.

use std::collections::BTreeMap;

use crate::error::PropertyError;
use crate::property::wire::{from_plain_json, to_plain_json};
use crate::property::{PropertyMap, PropertyValue};

use super::FieldValue;

impl FieldValue for bool {
    const KIND: &'static str = "bool";

    fn to_property(&self) -> PropertyValue {
        PropertyValue::Bool(*self)
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        match value.unwrap_secret() {
            PropertyValue::Bool(b) => Ok(*b),
            other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
        }
    }
}

impl FieldValue for String {
    const KIND: &'static str = "string";

    fn to_property(&self) -> PropertyValue {
        PropertyValue::String(self.clone())
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        match value.unwrap_secret() {
            PropertyValue::String(s) => Ok(s.clone()),
            other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
        }
    }
}

impl FieldValue for f64 {
    const KIND: &'static str = "number";

    fn to_property(&self) -> PropertyValue {
        PropertyValue::Number(*self)
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        match value.unwrap_secret() {
            PropertyValue::Number(n) => Ok(*n),
            other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
        }
    }
}

// Integers travel as f64; reading back truncates toward zero and saturates.
macro_rules! integer_field {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                const KIND: &'static str = stringify!($t);

                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn to_property(&self) -> PropertyValue {
                    PropertyValue::Number(*self as f64)
                }

                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
                    match value.unwrap_secret() {
                        PropertyValue::Number(n) => Ok(*n as $t),
                        other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
                    }
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: &'static str = T::KIND;

    fn to_property(&self) -> PropertyValue {
        self.as_ref().map_or(PropertyValue::Null, FieldValue::to_property)
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        if value.has_value() {
            T::from_property(field, value).map(Some)
        } else {
            Ok(None)
        }
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    const KIND: &'static str = "array";

    fn to_property(&self) -> PropertyValue {
        PropertyValue::Array(self.iter().map(FieldValue::to_property).collect())
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        match value.unwrap_secret() {
            PropertyValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_property(&format!("{field}[{i}]"), item))
                .collect(),
            other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
        }
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    const KIND: &'static str = "object";

    fn to_property(&self) -> PropertyValue {
        PropertyValue::Object(self.iter().map(|(k, v)| (k.clone(), v.to_property())).collect())
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        match value.unwrap_secret() {
            PropertyValue::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), T::from_property(&format!("{field}.{k}"), v)?)))
                .collect(),
            other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
        }
    }
}

// Free-form subtrees are carried as-is, secrets included.
impl FieldValue for PropertyMap {
    const KIND: &'static str = "object";

    fn to_property(&self) -> PropertyValue {
        PropertyValue::Object(self.clone())
    }

    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        match value {
            PropertyValue::Object(map) => Ok(map.clone()),
            // A secret object stays secret member by member.
            PropertyValue::Secret(inner) => match inner.unwrap_secret() {
                PropertyValue::Object(map) => Ok(map
                    .iter()
                    .map(|(k, v)| (k.clone(), PropertyValue::secret(v.clone())))
                    .collect()),
                other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
            },
            other => Err(PropertyError::mismatch(field, other.kind_name(), Self::KIND)),
        }
    }
}

impl FieldValue for PropertyValue {
    const KIND: &'static str = "any";

    fn to_property(&self) -> PropertyValue {
        self.clone()
    }

    fn from_property(_field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        Ok(value.clone())
    }
}

// Pass-through JSON for REST fields this provider does not model.
impl FieldValue for serde_json::Value {
    const KIND: &'static str = "any";

    fn to_property(&self) -> PropertyValue {
        from_plain_json(self)
    }

    fn from_property(_field: &str, value: &PropertyValue) -> Result<Self, PropertyError> {
        Ok(to_plain_json(value))
    }
}
