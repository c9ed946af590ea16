use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enum_values::EnumValues;
use super::field_kind::FieldKind;
use super::field_path::FieldPath;
use crate::error::SchemaError;

/// The normalized description of one queryable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    /// Allowed literals; present iff `kind` is `enum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<EnumValues>,
    /// Element kind; present iff `kind` is `array`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_kind: Option<FieldKind>,
    /// True when the backend needs an alternate suffix (`.keyword`) for
    /// equality lookups on this field.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exact_match: bool,
}

impl FieldSpec {
    /// A plain scalar (or object) spec of the given kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            values: None,
            item_kind: None,
            exact_match: false,
        }
    }

    /// An enum spec with its allowed values.
    pub fn enumeration(values: EnumValues) -> Self {
        Self {
            kind: FieldKind::Enum,
            values: Some(values),
            item_kind: None,
            exact_match: false,
        }
    }

    /// An array spec with the given element kind.
    pub fn array(item_kind: FieldKind) -> Self {
        Self {
            kind: FieldKind::Array,
            values: None,
            item_kind: Some(item_kind),
            exact_match: false,
        }
    }

    /// Marks the field as needing the exact-match suffix on the search backend.
    pub fn with_exact_match(mut self) -> Self {
        self.exact_match = true;
        self
    }

    /// Checks that the optional parts agree with the kind.
    fn check_coherent(&self, path: &str) -> Result<(), SchemaError> {
        match self.kind {
            FieldKind::Enum if self.values.is_none() => Err(SchemaError::SpecMismatch {
                path: path.to_string(),
                reason: "enum kind requires a value set".to_string(),
            }),
            FieldKind::Array if self.item_kind.is_none() => Err(SchemaError::SpecMismatch {
                path: path.to_string(),
                reason: "array kind requires an item kind".to_string(),
            }),
            _ if self.values.is_some() && self.kind != FieldKind::Enum => {
                Err(SchemaError::SpecMismatch {
                    path: path.to_string(),
                    reason: format!("values are only legal on enum fields, not {}", self.kind),
                })
            }
            _ if self.item_kind.is_some() && self.kind != FieldKind::Array => {
                Err(SchemaError::SpecMismatch {
                    path: path.to_string(),
                    reason: format!("item kind is only legal on array fields, not {}", self.kind),
                })
            }
            _ => Ok(()),
        }
    }
}

/// The canonical flattened description of queryable fields, keyed by
/// dotted path.
///
/// Backed by a `BTreeMap` for deterministic iteration, which keeps plan
/// output and prompt rendering stable across runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldMap(BTreeMap<String, FieldSpec>);

impl FieldMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a field, validating the path spelling, spec coherence, and
    /// path uniqueness.
    pub fn insert(&mut self, path: &str, spec: FieldSpec) -> Result<(), SchemaError> {
        FieldPath::parse(path)?;
        spec.check_coherent(path)?;
        if self.0.contains_key(path) {
            return Err(SchemaError::DuplicateFieldPath(path.to_string()));
        }
        self.0.insert(path.to_string(), spec);
        Ok(())
    }

    /// Returns the spec for a dotted path, if present.
    pub fn spec(&self, path: &str) -> Option<&FieldSpec> {
        self.0.get(path)
    }

    /// Membership check by dotted path.
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Removes a field, returning its spec if it was present.
    pub fn remove(&mut self, path: &str) -> Option<FieldSpec> {
        self.0.remove(path)
    }

    /// Rewrites an existing field to an enum with the given value set,
    /// preserving its exact-match flag.
    pub fn promote_to_enum(&mut self, path: &str, values: EnumValues) -> Result<(), SchemaError> {
        let spec = self.0.get_mut(path).ok_or_else(|| SchemaError::InvalidFieldPath {
            path: path.to_string(),
            reason: "no such field to promote".to_string(),
        })?;
        spec.kind = FieldKind::Enum;
        spec.values = Some(values);
        spec.item_kind = None;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(dotted_path, spec)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.0.iter()
    }

    /// Iterates the dotted paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}
