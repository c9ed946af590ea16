//! Pure schema inference over sampled documents.
//!
//! Each sampled document is walked recursively, accumulating per-path
//! type counters; finalization picks the modal kind per path. No I/O.

use std::collections::{BTreeMap, BTreeSet};

use mongodb::bson::{Bson, Document};
use serde_json::Value;

use query_forge_core::registry::{infer_kind, modal_kind};
use query_forge_core::types::{FieldKind, FieldMap, FieldSpec};

/// Per-path type observations accumulated over a document sample.
#[derive(Debug, Default)]
pub struct TypeObservations {
    counts: BTreeMap<String, BTreeMap<FieldKind, usize>>,
    item_kinds: BTreeMap<String, FieldKind>,
    parents: BTreeSet<String>,
    documents_seen: usize,
}

impl TypeObservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents_seen(&self) -> usize {
        self.documents_seen
    }

    /// Walks one sampled document, counting a kind observation per path.
    pub fn observe(&mut self, document: &Value) {
        self.documents_seen += 1;
        if let Some(map) = document.as_object() {
            for (name, value) in map {
                self.observe_value(name.clone(), value);
            }
        }
    }

    fn observe_value(&mut self, path: String, value: &Value) {
        match value {
            Value::Object(children) => {
                *self
                    .counts
                    .entry(path.clone())
                    .or_default()
                    .entry(FieldKind::Object)
                    .or_insert(0) += 1;
                if !children.is_empty() {
                    self.parents.insert(path.clone());
                }
                for (name, child) in children {
                    self.observe_value(format!("{path}.{name}"), child);
                }
            }
            Value::Array(elements) => {
                *self
                    .counts
                    .entry(path.clone())
                    .or_default()
                    .entry(FieldKind::Array)
                    .or_insert(0) += 1;
                // Item kind comes from the first observed element;
                // array elements are not descended into.
                if !self.item_kinds.contains_key(&path) {
                    if let Some(kind) = elements.first().and_then(infer_kind) {
                        self.item_kinds.insert(path, kind);
                    }
                }
            }
            other => {
                if let Some(kind) = infer_kind(other) {
                    *self.counts.entry(path).or_default().entry(kind).or_insert(0) += 1;
                }
            }
        }
    }

    /// Resolves the modal kind per path and assembles the field map.
    ///
    /// Object parents with observed leaves are dropped (only leaves
    /// appear); arrays whose elements were never seen default to string
    /// items with a recorded warning. An empty sample yields an empty map.
    pub fn finalize(self, fields_to_ignore: &[String]) -> (FieldMap, Vec<String>) {
        let mut fields = FieldMap::new();
        let mut warnings = Vec::new();

        for (path, counts) in &self.counts {
            if is_ignored(path, fields_to_ignore) {
                continue;
            }
            let Some(kind) = modal_kind(counts) else {
                continue;
            };
            let spec = match kind {
                FieldKind::Object => {
                    if self.parents.contains(path) {
                        continue;
                    }
                    FieldSpec::new(FieldKind::Object)
                }
                FieldKind::Array => {
                    let item = self.item_kinds.get(path).copied().unwrap_or_else(|| {
                        warnings.push(format!(
                            "'{path}': no array element observed; assuming string items"
                        ));
                        FieldKind::String
                    });
                    FieldSpec::array(item)
                }
                other => FieldSpec::new(other),
            };
            if let Err(e) = fields.insert(path, spec) {
                warnings.push(format!("skipped '{path}': {e}"));
            }
        }

        (fields, warnings)
    }
}

/// Infers a field map from a document sample in one call.
pub fn field_map_from_documents(
    documents: &[Value],
    fields_to_ignore: &[String],
) -> (FieldMap, Vec<String>) {
    let mut observations = TypeObservations::new();
    for document in documents {
        observations.observe(document);
    }
    observations.finalize(fields_to_ignore)
}

/// Converts a sampled BSON document into plain JSON for inference.
///
/// BSON-only scalars are folded into shapes the registry understands:
/// datetimes become RFC 3339 strings, object ids hex strings, decimals
/// numbers where representable. Types with no query meaning map to null
/// and carry no observation.
pub fn document_to_value(document: &Document) -> Value {
    let mut map = serde_json::Map::new();
    for (name, value) in document {
        map.insert(name.clone(), bson_to_value(value));
    }
    Value::Object(map)
}

fn bson_to_value(value: &Bson) -> Value {
    match value {
        Bson::Double(d) => serde_json::Number::from_f64(*d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(elements) => Value::Array(elements.iter().map(bson_to_value).collect()),
        Bson::Document(document) => document_to_value(document),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Null => Value::Null,
        Bson::Int32(i) => Value::Number((*i).into()),
        Bson::Int64(i) => Value::Number((*i).into()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or(Value::Null),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Decimal128(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::String(text))
        }
        Bson::Symbol(s) => Value::String(s.clone()),
        _ => Value::Null,
    }
}

fn is_ignored(path: &str, fields_to_ignore: &[String]) -> bool {
    fields_to_ignore
        .iter()
        .any(|ignored| path == ignored || path.starts_with(&format!("{ignored}.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};
    use serde_json::json;

    #[test]
    fn infers_scalar_kinds() {
        let (fields, warnings) = field_map_from_documents(
            &[json!({
                "amount": 120.5,
                "currency": "USD",
                "flagged": false,
                "timestamp": "2024-03-01T10:00:00Z"
            })],
            &[],
        );
        assert!(warnings.is_empty());
        assert_eq!(fields.spec("amount").unwrap().kind, FieldKind::Number);
        assert_eq!(fields.spec("currency").unwrap().kind, FieldKind::String);
        assert_eq!(fields.spec("flagged").unwrap().kind, FieldKind::Boolean);
        assert_eq!(fields.spec("timestamp").unwrap().kind, FieldKind::Date);
        assert!(!fields.spec("currency").unwrap().exact_match);
    }

    #[test]
    fn flattens_objects_to_leaves() {
        let (fields, _) = field_map_from_documents(
            &[json!({"receiver": {"name": "Acme", "account": {"iban": "DE00"}}})],
            &[],
        );
        assert!(fields.contains("receiver.name"));
        assert!(fields.contains("receiver.account.iban"));
        assert!(!fields.contains("receiver"));
        assert!(!fields.contains("receiver.account"));
    }

    #[test]
    fn arrays_record_first_element_kind() {
        let (fields, _) = field_map_from_documents(
            &[json!({"tags": ["a", "b"], "entries": [{"sku": "x"}], "scores": [1, 2]})],
            &[],
        );
        let tags = fields.spec("tags").unwrap();
        assert_eq!(tags.kind, FieldKind::Array);
        assert_eq!(tags.item_kind, Some(FieldKind::String));
        assert_eq!(fields.spec("entries").unwrap().item_kind, Some(FieldKind::Object));
        assert_eq!(fields.spec("scores").unwrap().item_kind, Some(FieldKind::Number));
    }

    #[test]
    fn empty_arrays_default_to_string_items_with_warning() {
        let (fields, warnings) = field_map_from_documents(&[json!({"tags": []})], &[]);
        assert_eq!(fields.spec("tags").unwrap().item_kind, Some(FieldKind::String));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn conflicting_observations_resolve_to_modal_kind() {
        let mut docs = vec![json!({"code": "A1"}); 3];
        docs.extend(vec![json!({"code": 7}); 5]);
        let (fields, _) = field_map_from_documents(&docs, &[]);
        assert_eq!(fields.spec("code").unwrap().kind, FieldKind::Number);
    }

    #[test]
    fn nulls_carry_no_observation() {
        let (fields, _) = field_map_from_documents(
            &[json!({"a": null}), json!({"a": "text"})],
            &[],
        );
        assert_eq!(fields.spec("a").unwrap().kind, FieldKind::String);
    }

    #[test]
    fn empty_sample_yields_empty_map() {
        let (fields, warnings) = field_map_from_documents(&[], &[]);
        assert!(fields.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn ignore_list_prunes() {
        let (fields, _) = field_map_from_documents(
            &[json!({"keep": 1, "drop": 2, "nested": {"drop": 3}})],
            &["drop".to_string(), "nested".to_string()],
        );
        assert!(fields.contains("keep"));
        assert!(!fields.contains("drop"));
        assert!(!fields.contains("nested.drop"));
    }

    #[test]
    fn object_without_children_is_kept_as_object() {
        let (fields, _) = field_map_from_documents(&[json!({"meta": {}})], &[]);
        assert_eq!(fields.spec("meta").unwrap().kind, FieldKind::Object);
    }

    #[test]
    fn bson_scalars_fold_into_json_shapes() {
        let oid = ObjectId::new();
        let document = doc! {
            "_id": oid,
            "amount": 12.5_f64,
            "count": 3_i32,
            "big": 9_000_000_000_i64,
            "name": "Acme",
            "active": true,
            "when": mongodb::bson::DateTime::from_millis(1_700_000_000_000),
            "nothing": Bson::Null,
        };
        let value = document_to_value(&document);
        assert_eq!(value["_id"], json!(oid.to_hex()));
        assert_eq!(value["amount"], json!(12.5));
        assert_eq!(value["count"], json!(3));
        assert_eq!(value["big"], json!(9_000_000_000_i64));
        assert_eq!(value["active"], json!(true));
        assert!(value["when"].as_str().unwrap().starts_with("2023-11-"));
        assert_eq!(value["nothing"], Value::Null);
    }

    #[test]
    fn sampled_bson_datetime_infers_date_kind() {
        let document = doc! {"ts": mongodb::bson::DateTime::from_millis(1_700_000_000_000)};
        let (fields, _) = field_map_from_documents(&[document_to_value(&document)], &[]);
        assert_eq!(fields.spec("ts").unwrap().kind, FieldKind::Date);
    }
}
