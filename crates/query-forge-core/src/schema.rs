//! The filter schema: per-field rules derived from a `FieldMap`, the
//! validator entry point bound to them, and the prompt descriptor handed
//! to the external model.

use serde::Serialize;
use serde_json::Value;

use crate::error::{SchemaError, ValidationError};
use crate::types::{FieldKind, FieldMap, Operator};
use crate::validate::{self, Validated};

/// The legal operators for a normalized field kind.
///
/// This is the closed rule set; the validator and the prompt descriptor
/// both read from it, so the model is told exactly what the validator
/// will accept.
pub fn legal_operators(kind: FieldKind) -> &'static [Operator] {
    use Operator::*;
    match kind {
        FieldKind::String => &[Is, Different, Contains, IsIn, NotIn, Exists],
        FieldKind::Number => &[Lt, Gt, Is, Different, Between, IsIn, NotIn, Exists],
        FieldKind::Date => &[Lt, Gt, Is, Different, Between, Exists],
        FieldKind::Boolean => &[Is, Different, Exists],
        FieldKind::Enum => &[Is, Different, IsIn, NotIn, Exists],
        FieldKind::Array | FieldKind::Object => &[Exists],
    }
}

/// One field's entry in the prompt descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub path: String,
    pub kind: FieldKind,
    pub operators: Vec<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// The machine-readable schema summary consumed by the prompt generator.
///
/// The validator remains the source of truth; this is advisory input for
/// the external model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptDescriptor {
    pub fields: Vec<FieldDescriptor>,
}

impl PromptDescriptor {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A validator bound to one `FieldMap`.
///
/// Built once per schema and cached by the orchestrator; validation and
/// descriptor rendering are pure reads.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSchema {
    fields: FieldMap,
}

impl FilterSchema {
    /// Binds a schema to a field map. An empty map cannot validate
    /// anything and is refused.
    pub fn new(fields: FieldMap) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::EmptyFieldMap);
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Validates and canonicalizes an untyped filter document.
    pub fn validate(&self, raw: &Value) -> Result<Validated, ValidationError> {
        validate::validate_document(&self.fields, raw)
    }

    /// Enumerates fields, kinds, legal operators, and enum values for the
    /// prompt generator.
    pub fn descriptor(&self) -> PromptDescriptor {
        let fields = self
            .fields
            .iter()
            .map(|(path, spec)| FieldDescriptor {
                path: path.clone(),
                kind: spec.kind,
                operators: legal_operators(spec.kind).to_vec(),
                values: spec
                    .values
                    .as_ref()
                    .map(|v| v.iter().cloned().collect()),
            })
            .collect();
        PromptDescriptor { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumValues, FieldSpec};

    fn sample_map() -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("t.amt", FieldSpec::new(FieldKind::Number)).unwrap();
        map.insert("t.ts", FieldSpec::new(FieldKind::Date)).unwrap();
        map.insert(
            "card_type",
            FieldSpec::enumeration(EnumValues::new(vec!["GOLD".into(), "SILVER".into()]).unwrap())
                .with_exact_match(),
        )
        .unwrap();
        map
    }

    #[test]
    fn empty_map_is_refused() {
        assert!(matches!(
            FilterSchema::new(FieldMap::new()),
            Err(SchemaError::EmptyFieldMap)
        ));
    }

    #[test]
    fn legality_table() {
        assert!(legal_operators(FieldKind::String).contains(&Operator::Contains));
        assert!(!legal_operators(FieldKind::String).contains(&Operator::Between));
        assert!(legal_operators(FieldKind::Number).contains(&Operator::Between));
        assert!(!legal_operators(FieldKind::Number).contains(&Operator::Contains));
        assert!(legal_operators(FieldKind::Date).contains(&Operator::Lt));
        assert!(!legal_operators(FieldKind::Date).contains(&Operator::IsIn));
        assert_eq!(legal_operators(FieldKind::Boolean).len(), 3);
        assert!(!legal_operators(FieldKind::Enum).contains(&Operator::Contains));
        assert_eq!(legal_operators(FieldKind::Array), &[Operator::Exists]);
        assert_eq!(legal_operators(FieldKind::Object), &[Operator::Exists]);
    }

    #[test]
    fn every_kind_allows_exists() {
        for kind in [
            FieldKind::String,
            FieldKind::Number,
            FieldKind::Date,
            FieldKind::Boolean,
            FieldKind::Enum,
            FieldKind::Array,
            FieldKind::Object,
        ] {
            assert!(legal_operators(kind).contains(&Operator::Exists));
        }
    }

    #[test]
    fn descriptor_lists_every_field() {
        let schema = FilterSchema::new(sample_map()).unwrap();
        let descriptor = schema.descriptor();
        assert_eq!(descriptor.len(), 3);
        let card = descriptor
            .fields
            .iter()
            .find(|f| f.path == "card_type")
            .unwrap();
        assert_eq!(card.kind, FieldKind::Enum);
        assert_eq!(
            card.values.as_deref(),
            Some(["GOLD".to_string(), "SILVER".to_string()].as_slice())
        );
        assert!(card.operators.contains(&Operator::IsIn));
        let amt = descriptor.fields.iter().find(|f| f.path == "t.amt").unwrap();
        assert!(amt.values.is_none());
    }

    #[test]
    fn descriptor_serializes_operator_spellings() {
        let schema = FilterSchema::new(sample_map()).unwrap();
        let json = serde_json::to_value(schema.descriptor()).unwrap();
        // Field order is path order: card_type, t.amt, t.ts.
        let ops = json["fields"][1]["operators"].as_array().unwrap();
        assert!(ops.iter().any(|o| o == "<"));
        assert!(ops.iter().any(|o| o == "between"));
    }
}
