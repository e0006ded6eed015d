//! The self-describing property value tree.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// A state value exchanged with the host engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    /// Explicit null; treated as absent by most consumers.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar. Integers travel as `f64` on the wire.
    Number(f64),
    /// String scalar.
    String(String),
    /// Ordered list of values.
    Array(Vec<PropertyValue>),
    /// Nested object.
    Object(PropertyMap),
    /// Text asset blob.
    Asset(String),
    /// A value whose contents must not be revealed.
    Secret(Box<PropertyValue>),
    /// A value not yet known (during preview).
    Unknown,
}

impl PropertyValue {
    /// Wraps a value as secret. Already-secret values are not double wrapped.
    #[must_use]
    pub fn secret(value: impl Into<Self>) -> Self {
        match value.into() {
            s @ Self::Secret(_) => s,
            other => Self::Secret(Box::new(other)),
        }
    }

    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Asset(_) => "asset",
            Self::Secret(_) => "secret",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for a top-level `Secret`.
    #[must_use]
    pub const fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }

    /// Returns true for `Unknown`.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true if the value carries a usable value (not null, not unknown).
    #[must_use]
    pub fn has_value(&self) -> bool {
        !matches!(self.unwrap_secret(), Self::Null | Self::Unknown)
    }

    /// Returns true if a `Secret` appears anywhere in this tree.
    #[must_use]
    pub fn contains_secrets(&self) -> bool {
        match self {
            Self::Secret(_) => true,
            Self::Array(items) => items.iter().any(Self::contains_secrets),
            Self::Object(map) => map.values().any(Self::contains_secrets),
            _ => false,
        }
    }

    /// Peels every `Secret` layer at the top of the value.
    #[must_use]
    pub fn unwrap_secret(&self) -> &Self {
        let mut current = self;
        while let Self::Secret(inner) = current {
            current = inner;
        }
        current
    }

    /// Consuming version of [`Self::unwrap_secret`].
    #[must_use]
    pub fn into_unwrapped(self) -> Self {
        match self {
            Self::Secret(inner) => inner.into_unwrapped(),
            other => other,
        }
    }

    /// String contents, looking through secrets.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.unwrap_secret() {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean contents, looking through secrets.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.unwrap_secret() {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric contents, looking through secrets.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self.unwrap_secret() {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Object contents, looking through secrets.
    #[must_use]
    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self.unwrap_secret() {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Array contents, looking through secrets.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self.unwrap_secret() {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Deep equality that ignores secrecy: `Secret(x)` equals `x`.
    #[must_use]
    pub fn same_contents(&self, other: &Self) -> bool {
        match (self.unwrap_secret(), other.unwrap_secret()) {
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_contents(y))
            }
            (Self::Object(a), Self::Object(b)) => a.same_contents(b),
            (a, b) => a == b,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(value: PropertyMap) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Self>> for PropertyValue {
    fn from(value: Vec<Self>) -> Self {
        Self::Array(value)
    }
}

/// Key/value state object. Keys iterate in sorted order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// String value for `key`, looking through secrets.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(PropertyValue::as_str)
    }

    /// Returns a copy without top-level `Null` entries.
    #[must_use]
    pub fn without_nulls(&self) -> Self {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Deep equality that ignores secrecy and treats `Null` as absent.
    #[must_use]
    pub fn same_contents(&self, other: &Self) -> bool {
        let left = self.without_nulls();
        let right = other.without_nulls();
        left.len() == right.len()
            && left
                .iter()
                .all(|(k, v)| right.get(k).is_some_and(|o| v.same_contents(o)))
    }

    /// Unwraps the inner map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, PropertyValue> {
        self.0
    }
}

impl Deref for PropertyMap {
    type Target = BTreeMap<String, PropertyValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PropertyMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyMap {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, PropertyValue)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, PropertyValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
