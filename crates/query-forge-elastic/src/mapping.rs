//! Pure functions for flattening a search-engine `properties` tree into
//! the normalized field map.
//!
//! No I/O. The live extractor in `backend` feeds this from a mapping
//! call; the offline path feeds it a user-supplied mapping document.

use serde_json::Value;

use query_forge_core::error::SchemaError;
use query_forge_core::registry::kind_for_search_type;
use query_forge_core::types::{FieldKind, FieldMap, FieldSpec};

/// The outcome of one mapping walk: the flattened fields plus the
/// entries that were skipped as malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingWalk {
    pub fields: FieldMap,
    pub warnings: Vec<String>,
}

/// Flattens a `properties` tree into a `FieldMap`.
///
/// `object` nodes descend without emitting an entry (only leaves appear);
/// `nested` nodes emit an array-of-object entry *and* descend, since the
/// backend addresses their leaves by dotted path. Malformed entries are
/// skipped with a recorded warning. `fields_to_ignore` prunes exact paths
/// and their subtrees.
pub fn field_map_from_properties(
    properties: &Value,
    fields_to_ignore: &[String],
) -> Result<MappingWalk, SchemaError> {
    let root = properties.as_object().ok_or_else(|| SchemaError::MalformedMapping {
        reason: "'properties' is not an object".to_string(),
    })?;

    let mut walk = MappingWalk {
        fields: FieldMap::new(),
        warnings: Vec::new(),
    };
    walk_properties(root, "", fields_to_ignore, &mut walk)?;
    Ok(walk)
}

/// Accepts either a bare `properties` object or a `{"properties": ...}`
/// wrapper, the two spellings user-supplied mapping documents arrive in.
pub fn properties_of(document: &Value) -> &Value {
    document.get("properties").unwrap_or(document)
}

/// Digs the `properties` tree out of a live get-mapping response,
/// which is keyed by (possibly aliased) index name.
pub fn properties_from_mapping_response<'a>(index: &str, body: &'a Value) -> Option<&'a Value> {
    let by_index = body
        .get(index)
        .or_else(|| body.as_object().and_then(|o| o.values().next()))?;
    by_index.get("mappings")?.get("properties")
}

fn walk_properties(
    properties: &serde_json::Map<String, Value>,
    prefix: &str,
    fields_to_ignore: &[String],
    walk: &mut MappingWalk,
) -> Result<(), SchemaError> {
    for (name, node) in properties {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        if is_ignored(&path, fields_to_ignore) {
            continue;
        }

        let Some(entry) = node.as_object() else {
            walk.warnings
                .push(format!("skipped '{path}': mapping entry is not an object"));
            continue;
        };

        let declared_type = entry.get("type").and_then(Value::as_str);
        let children = entry.get("properties").and_then(Value::as_object);

        match (declared_type, children) {
            (Some("nested"), Some(children)) => {
                walk.fields.insert(&path, FieldSpec::array(FieldKind::Object))?;
                walk_properties(children, &path, fields_to_ignore, walk)?;
            }
            (Some("object") | None, Some(children)) => {
                walk_properties(children, &path, fields_to_ignore, walk)?;
            }
            (Some(type_name), _) => match kind_for_search_type(type_name) {
                Some(FieldKind::String) => {
                    walk.fields
                        .insert(&path, FieldSpec::new(FieldKind::String).with_exact_match())?;
                }
                Some(FieldKind::Array) => {
                    // `nested` without sub-properties: an opaque array of objects.
                    walk.fields.insert(&path, FieldSpec::array(FieldKind::Object))?;
                }
                Some(kind) => {
                    walk.fields.insert(&path, FieldSpec::new(kind))?;
                }
                None => {
                    walk.warnings
                        .push(format!("skipped '{path}': unsupported mapping type '{type_name}'"));
                }
            },
            (None, None) => {
                walk.warnings
                    .push(format!("skipped '{path}': mapping entry has no type"));
            }
        }
    }
    Ok(())
}

fn is_ignored(path: &str, fields_to_ignore: &[String]) -> bool {
    fields_to_ignore
        .iter()
        .any(|ignored| path == ignored || path.starts_with(&format!("{ignored}.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transactions_mapping() -> Value {
        json!({
            "transaction": {
                "properties": {
                    "id": {"type": "keyword"},
                    "amount": {"type": "double"},
                    "timestamp": {"type": "date"},
                    "receiver": {
                        "properties": {
                            "name": {"type": "text"}
                        }
                    },
                    "entries": {
                        "type": "nested",
                        "properties": {
                            "sku": {"type": "keyword"},
                            "qty": {"type": "integer"}
                        }
                    }
                }
            },
            "card_type": {"type": "keyword"},
            "flagged": {"type": "boolean"}
        })
    }

    #[test]
    fn flattens_to_dotted_leaves() {
        let walk = field_map_from_properties(&transactions_mapping(), &[]).unwrap();
        assert!(walk.fields.contains("transaction.id"));
        assert!(walk.fields.contains("transaction.amount"));
        assert!(walk.fields.contains("transaction.receiver.name"));
        assert!(walk.fields.contains("card_type"));
        // Object parents do not appear alongside their leaves.
        assert!(!walk.fields.contains("transaction"));
        assert!(!walk.fields.contains("transaction.receiver"));
    }

    #[test]
    fn type_table_applies() {
        let walk = field_map_from_properties(&transactions_mapping(), &[]).unwrap();
        assert_eq!(walk.fields.spec("transaction.id").unwrap().kind, FieldKind::String);
        assert_eq!(
            walk.fields.spec("transaction.amount").unwrap().kind,
            FieldKind::Number
        );
        assert_eq!(
            walk.fields.spec("transaction.timestamp").unwrap().kind,
            FieldKind::Date
        );
        assert_eq!(walk.fields.spec("flagged").unwrap().kind, FieldKind::Boolean);
    }

    #[test]
    fn string_fields_are_exact_match_capable() {
        let walk = field_map_from_properties(&transactions_mapping(), &[]).unwrap();
        assert!(walk.fields.spec("transaction.id").unwrap().exact_match);
        assert!(walk.fields.spec("transaction.receiver.name").unwrap().exact_match);
        assert!(!walk.fields.spec("transaction.amount").unwrap().exact_match);
        assert!(!walk.fields.spec("flagged").unwrap().exact_match);
    }

    #[test]
    fn nested_marks_parent_as_array_and_descends() {
        let walk = field_map_from_properties(&transactions_mapping(), &[]).unwrap();
        let entries = walk.fields.spec("transaction.entries").unwrap();
        assert_eq!(entries.kind, FieldKind::Array);
        assert_eq!(entries.item_kind, Some(FieldKind::Object));
        assert!(walk.fields.contains("transaction.entries.sku"));
        assert_eq!(
            walk.fields.spec("transaction.entries.qty").unwrap().kind,
            FieldKind::Number
        );
    }

    #[test]
    fn ignore_list_prunes_paths_and_subtrees() {
        let ignore = vec!["transaction.receiver".to_string(), "flagged".to_string()];
        let walk = field_map_from_properties(&transactions_mapping(), &ignore).unwrap();
        assert!(!walk.fields.contains("transaction.receiver.name"));
        assert!(!walk.fields.contains("flagged"));
        assert!(walk.fields.contains("transaction.id"));
    }

    #[test]
    fn malformed_entries_are_skipped_with_warnings() {
        let mapping = json!({
            "good": {"type": "keyword"},
            "no_type": {},
            "not_an_object": 42,
            "weird_type": {"type": "geo_point"}
        });
        let walk = field_map_from_properties(&mapping, &[]).unwrap();
        assert_eq!(walk.fields.len(), 1);
        assert_eq!(walk.warnings.len(), 3);
        assert!(walk.warnings.iter().any(|w| w.contains("no_type")));
        assert!(walk.warnings.iter().any(|w| w.contains("not_an_object")));
        assert!(walk.warnings.iter().any(|w| w.contains("geo_point")));
    }

    #[test]
    fn non_object_root_is_an_error() {
        assert!(matches!(
            field_map_from_properties(&json!("nope"), &[]),
            Err(SchemaError::MalformedMapping { .. })
        ));
    }

    #[test]
    fn empty_properties_yield_empty_map() {
        let walk = field_map_from_properties(&json!({}), &[]).unwrap();
        assert!(walk.fields.is_empty());
        assert!(walk.warnings.is_empty());
    }

    #[test]
    fn properties_of_unwraps_both_spellings() {
        let wrapped = json!({"properties": {"a": {"type": "keyword"}}});
        let bare = json!({"a": {"type": "keyword"}});
        assert_eq!(properties_of(&wrapped), &bare);
        assert_eq!(properties_of(&bare), &bare);
    }

    #[test]
    fn mapping_response_digging() {
        let body = json!({
            "transactions-v2": {"mappings": {"properties": {"a": {"type": "long"}}}}
        });
        // Exact index name match.
        let props = properties_from_mapping_response("transactions-v2", &body).unwrap();
        assert!(props.get("a").is_some());
        // Aliased: falls back to the first (only) entry.
        let props = properties_from_mapping_response("transactions", &body).unwrap();
        assert!(props.get("a").is_some());
    }
}
