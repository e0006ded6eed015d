//! Conversion between typed resource records and property maps.
//!
//! Records opt in field by field through [`property_record!`], which names the
//! wire key of every participating field and optionally flags it `secret`.
//! Fields not listed are ignored in both directions.
//!
//! ```
//! use pulumiservice_provider::property_record;
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Hook {
//!     name: String,
//!     active: bool,
//!     secret: Option<String>,
//! }
//!
//! property_record!(Hook {
//!     name => "name",
//!     active => "active",
//!     #[secret] secret => "secret",
//! });
//! ```

mod fields;

use crate::error::PropertyError;
use crate::property::{PropertyMap, PropertyValue};

/// A record that converts to and from a [`PropertyMap`].
pub trait PropertyRecord: Sized {
    /// Encodes the record. Absent optional fields are omitted.
    fn to_property_map(&self) -> PropertyMap;

    /// Decodes `map` into `record`. Keys that are missing, null or unknown
    /// leave the corresponding field untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::FieldTypeMismatch`] when a wire value does not
    /// fit its field.
    fn from_property_map(map: &PropertyMap, record: &mut Self) -> Result<(), PropertyError>;

    /// Decodes `map` into a default-initialized record.
    ///
    /// # Errors
    ///
    /// See [`PropertyRecord::from_property_map`].
    fn decode(map: &PropertyMap) -> Result<Self, PropertyError>
    where
        Self: Default,
    {
        let mut record = Self::default();
        Self::from_property_map(map, &mut record)?;
        Ok(record)
    }
}

/// A single field kind the codec understands.
pub trait FieldValue: Sized {
    /// Kind name reported in mismatch errors.
    const KIND: &'static str;

    /// Encodes the field.
    fn to_property(&self) -> PropertyValue;

    /// Decodes the field. Secret wrappers are looked through.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::FieldTypeMismatch`] on a kind mismatch.
    fn from_property(field: &str, value: &PropertyValue) -> Result<Self, PropertyError>;

    /// Absent fields are left out of the encoded map.
    fn is_absent(&self) -> bool {
        false
    }
}

/// Implements [`PropertyRecord`] and [`FieldValue`] for a struct.
///
/// The struct must implement `Default` so it can be nested in other records.
#[macro_export]
macro_rules! property_record {
    (@wrap secret $value:ident) => {
        $crate::property::PropertyValue::secret($value)
    };
    (@wrap $value:ident) => {
        $value
    };
    ($ty:ident { $( $(#[$flag:ident])? $field:ident => $wire:literal ),* $(,)? }) => {
        impl $crate::codec::PropertyRecord for $ty {
            fn to_property_map(&self) -> $crate::property::PropertyMap {
                let mut map = $crate::property::PropertyMap::new();
                $(
                    if !$crate::codec::FieldValue::is_absent(&self.$field) {
                        let value = $crate::codec::FieldValue::to_property(&self.$field);
                        map.insert(
                            ::std::string::String::from($wire),
                            $crate::property_record!(@wrap $($flag)? value),
                        );
                    }
                )*
                map
            }

            fn from_property_map(
                map: &$crate::property::PropertyMap,
                record: &mut Self,
            ) -> ::std::result::Result<(), $crate::error::PropertyError> {
                $(
                    if let Some(value) = map.get($wire) {
                        if value.has_value() {
                            record.$field = $crate::codec::FieldValue::from_property($wire, value)?;
                        }
                    }
                )*
                Ok(())
            }
        }

        impl $crate::codec::FieldValue for $ty {
            const KIND: &'static str = "object";

            fn to_property(&self) -> $crate::property::PropertyValue {
                $crate::property::PropertyValue::Object(
                    $crate::codec::PropertyRecord::to_property_map(self),
                )
            }

            fn from_property(
                field: &str,
                value: &$crate::property::PropertyValue,
            ) -> ::std::result::Result<Self, $crate::error::PropertyError> {
                match value.unwrap_secret() {
                    $crate::property::PropertyValue::Object(map) => {
                        <Self as $crate::codec::PropertyRecord>::decode(map)
                    }
                    other => Err($crate::error::PropertyError::mismatch(
                        field,
                        other.kind_name(),
                        "object",
                    )),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Options {
        shell: Option<String>,
        skip_install: bool,
    }

    property_record!(Options {
        shell => "shell",
        skip_install => "skipInstallDependencies",
    });

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Record {
        name: String,
        enabled: bool,
        ratio: f64,
        retries: i32,
        size: u64,
        options: Options,
        maybe: Option<Options>,
        commands: Vec<String>,
        token: Option<String>,
        not_on_the_wire: u8,
    }

    property_record!(Record {
        name => "name",
        enabled => "enabled",
        ratio => "ratio",
        retries => "retries",
        size => "size",
        options => "options",
        maybe => "maybe",
        commands => "commands",
        #[secret] token => "token",
    });

    fn sample() -> Record {
        Record {
            name: String::from("web"),
            enabled: true,
            ratio: 0.25,
            retries: -3,
            size: 4096,
            options: Options {
                shell: Some(String::from("/bin/bash")),
                skip_install: true,
            },
            maybe: None,
            commands: vec![String::from("npm ci"), String::from("npm test")],
            token: Some(String::from("tok")),
            not_on_the_wire: 0,
        }
    }

    #[test]
    fn test_round_trip() {
        let record = sample();
        let decoded = Record::decode(&record.to_property_map()).expect("decode");
        assert_eq!(decoded, record);

        let with_nested = Record {
            maybe: Some(Options::default()),
            ..sample()
        };
        let decoded = Record::decode(&with_nested.to_property_map()).expect("decode");
        assert_eq!(decoded, with_nested);
    }

    #[test]
    fn test_unlisted_fields_are_ignored() {
        let record = Record {
            not_on_the_wire: 9,
            ..sample()
        };
        let map = record.to_property_map();
        assert!(!map.contains_key("not_on_the_wire"));
        assert_eq!(Record::decode(&map).expect("decode").not_on_the_wire, 0);
    }

    #[test]
    fn test_secret_fields_are_wrapped_and_unwrapped() {
        let map = sample().to_property_map();
        assert_eq!(map["token"], PropertyValue::secret("tok"));
        assert!(!map["name"].is_secret());

        let wrapped = PropertyMap::new().with("name", PropertyValue::secret("hidden"));
        assert_eq!(Record::decode(&wrapped).expect("decode").name, "hidden");
    }

    #[test]
    fn test_absent_optional_is_omitted_and_left_unset() {
        let map = Record {
            token: None,
            ..sample()
        }
        .to_property_map();
        assert!(!map.contains_key("token"));
        assert!(!map.contains_key("maybe"));

        let decoded = Record::decode(&PropertyMap::new().with("name", "x")).expect("decode");
        assert_eq!(decoded.token, None);
        assert_eq!(decoded.retries, 0);
    }

    #[test]
    fn test_null_and_unknown_leave_field_untouched() {
        let map = PropertyMap::new()
            .with("name", PropertyValue::Null)
            .with("retries", PropertyValue::Unknown);
        let mut record = sample();
        Record::from_property_map(&map, &mut record).expect("decode");
        assert_eq!(record, sample());
    }

    #[test]
    fn test_float_truncates_into_integer_fields() {
        let map = PropertyMap::new()
            .with("retries", -2.9)
            .with("size", 7.99);
        let decoded = Record::decode(&map).expect("decode");
        assert_eq!(decoded.retries, -2);
        assert_eq!(decoded.size, 7);
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let map = PropertyMap::new().with("enabled", "yes");
        let err = Record::decode(&map).expect_err("mismatch");
        assert!(matches!(
            err,
            PropertyError::FieldTypeMismatch {
                ref field,
                wire_kind: "string",
                field_kind: "bool",
            } if field == "enabled"
        ));
    }

    #[test]
    fn test_mismatch_inside_array_names_the_element() {
        let map = PropertyMap::new().with(
            "commands",
            vec![PropertyValue::from("ok"), PropertyValue::from(1.0)],
        );
        let err = Record::decode(&map).expect_err("mismatch");
        assert!(matches!(
            err,
            PropertyError::FieldTypeMismatch { ref field, .. } if field == "commands[1]"
        ));
    }
}
