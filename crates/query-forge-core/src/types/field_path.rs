use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SchemaError;

/// A dotted path naming one queryable field, e.g. `transaction.receiver.name`.
///
/// Serializes as the dotted string, which is the spelling the IR JSON and
/// both backends use. The underscore-joined spelling (`transaction_receiver_name`)
/// is used for metric and grouping key names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parses a dotted string like `"t.amt"` into a path.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        if s.is_empty() {
            return Err(SchemaError::EmptyFieldPath);
        }
        let segments: Vec<String> = s.split('.').map(String::from).collect();
        for segment in &segments {
            if segment.is_empty() {
                return Err(SchemaError::InvalidFieldPath {
                    path: s.to_string(),
                    reason: "path contains empty segment".to_string(),
                });
            }
        }
        Ok(Self(segments))
    }

    /// Creates a path from a single segment (no dots).
    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns the last segment.
    pub fn leaf(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Returns the dotted string representation.
    pub fn as_dotted(&self) -> String {
        self.0.join(".")
    }

    /// Returns the underscore-joined spelling used in metric names.
    pub fn underscored(&self) -> String {
        self.0.join("_")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_dotted())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let p = FieldPath::parse("amount").unwrap();
        assert_eq!(p.segments(), &["amount"]);
        assert_eq!(p.depth(), 1);
        assert_eq!(p.leaf(), "amount");
    }

    #[test]
    fn parse_dotted() {
        let p = FieldPath::parse("transaction.receiver.name").unwrap();
        assert_eq!(p.depth(), 3);
        assert_eq!(p.leaf(), "name");
        assert_eq!(p.as_dotted(), "transaction.receiver.name");
        assert_eq!(p.underscored(), "transaction_receiver_name");
    }

    #[test]
    fn parse_empty_fails() {
        assert!(matches!(FieldPath::parse(""), Err(SchemaError::EmptyFieldPath)));
    }

    #[test]
    fn parse_empty_segment_fails() {
        for bad in ["a..b", ".a", "a."] {
            assert!(matches!(
                FieldPath::parse(bad),
                Err(SchemaError::InvalidFieldPath { .. })
            ));
        }
    }

    #[test]
    fn display_is_dotted() {
        let p = FieldPath::parse("t.amt").unwrap();
        assert_eq!(p.to_string(), "t.amt");
    }

    #[test]
    fn serializes_as_dotted_string() {
        let p = FieldPath::parse("t.amt").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"t.amt\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn deserialize_rejects_malformed() {
        assert!(serde_json::from_str::<FieldPath>("\"a..b\"").is_err());
        assert!(serde_json::from_str::<FieldPath>("\"\"").is_err());
    }
}
