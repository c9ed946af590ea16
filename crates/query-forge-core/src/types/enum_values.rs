use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SchemaError;

/// A non-empty, deduplicated, ordered list of enum value literals.
///
/// Populated from the backend's distinct-value aggregation for fields the
/// caller flagged as categorical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValues(Vec<String>);

impl EnumValues {
    /// Creates a new `EnumValues`, validating:
    /// - list is non-empty
    /// - no empty strings
    /// - no duplicates
    pub fn new(values: Vec<String>) -> Result<Self, SchemaError> {
        if values.is_empty() {
            return Err(SchemaError::EmptyEnumValues);
        }
        let mut seen = HashSet::with_capacity(values.len());
        for v in &values {
            if v.is_empty() {
                return Err(SchemaError::EmptyEnumValue);
            }
            if !seen.insert(v.as_str()) {
                return Err(SchemaError::DuplicateEnumValue(v.clone()));
            }
        }
        Ok(Self(values))
    }

    /// Returns the values as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always returns false (guaranteed non-empty by construction).
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Membership check against the value set.
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Returns an iterator over the values.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl fmt::Display for EnumValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl Serialize for EnumValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EnumValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<String>::deserialize(deserializer)?;
        Self::new(values).map_err(serde::de::Error::custom)
    }
}
