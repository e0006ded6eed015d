//! Plaintext retention rules for secret-valued properties.
//!
//! The service only ever returns ciphertext for secret fields. Outputs always
//! record that ciphertext. Inputs record plaintext according to how the state
//! was obtained:
//!
//! | situation | input value                              |
//! |-----------|------------------------------------------|
//! | create    | `Secret(plaintext)`                      |
//! | import    | `Secret(REPLACE_ME)`                     |
//! | merge     | old plaintext if ciphertext unchanged, else `Secret("")` |
//!
//! The same rules apply to every resource type.

use tracing::debug;

use crate::property::{PropertyMap, PropertyValue};

/// Placeholder stored for imported secret inputs.
pub const REPLACE_ME: &str = "<REPLACE WITH ACTUAL SECRET VALUE>";

/// Which side of a resource's state a value is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRole {
    /// User-supplied inputs.
    Input,
    /// Provider-computed outputs.
    Output,
}

/// How the state being written was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource<'a> {
    /// Created or updated by this provider; plaintext is known.
    Create {
        /// The plaintext that was sent.
        plaintext: &'a str,
    },
    /// Imported; plaintext was never seen.
    Import,
    /// Refreshed from the service.
    Merge {
        /// Previously recorded plaintext input.
        plaintext: Option<&'a str>,
        /// Previously recorded ciphertext output, if any.
        old_ciphertext: Option<&'a str>,
    },
}

/// Computes the value to record for a secret field.
#[must_use]
pub fn resolve(source: SecretSource<'_>, ciphertext: &str, role: SecretRole) -> PropertyValue {
    if role == SecretRole::Output {
        return PropertyValue::from(ciphertext);
    }

    match source {
        SecretSource::Create { plaintext } => PropertyValue::secret(plaintext),
        SecretSource::Import => PropertyValue::secret(REPLACE_ME),
        SecretSource::Merge {
            plaintext,
            old_ciphertext,
        } => {
            if old_ciphertext.is_some_and(|old| old == ciphertext) {
                PropertyValue::secret(plaintext.unwrap_or_default())
            } else {
                debug!("Secret ciphertext changed remotely; blanking recorded plaintext");
                PropertyValue::secret("")
            }
        }
    }
}

/// Writes the resolved value for `key` into `map`.
pub fn apply(
    map: &mut PropertyMap,
    key: &str,
    source: SecretSource<'_>,
    ciphertext: &str,
    role: SecretRole,
) {
    map.insert(key.to_string(), resolve(source, ciphertext, role));
}

/// Returns true if `value` still holds the import placeholder.
#[must_use]
pub fn needs_replacement(value: &PropertyValue) -> bool {
    value.as_str() == Some(REPLACE_ME)
}
