pub mod schema;
pub mod translate;
pub mod validate;

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use query_forge_core::types::{EnumValues, FieldMap};
use query_forge_elastic::mapping::field_map_from_properties;

use crate::error::CliError;

/// Reads a JSON document from a file, or stdin when the path is `-`.
pub(crate) fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?
    };
    serde_json::from_str(&text).map_err(|e| CliError::BadJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Builds a field map from a user-supplied mapping/enum document, the
/// offline stand-in for a live backend.
///
/// Accepts either a bare `properties` tree, or an object with a
/// `properties` tree and an optional sibling `enums` table
/// (`{"enums": {"card_type": ["GOLD", "SILVER"]}}`).
pub(crate) fn field_map_from_mapping_file(path: &Path) -> Result<FieldMap, CliError> {
    let document = read_json(path)?;
    let (properties, enums) = match document.get("properties") {
        Some(properties) => (properties, document.get("enums")),
        None => (&document, None),
    };

    let walk = field_map_from_properties(properties, &[])?;
    for warning in &walk.warnings {
        tracing::warn!("{warning}");
    }

    let mut fields = walk.fields;
    if let Some(enums) = enums.and_then(Value::as_object) {
        for (field, raw_values) in enums {
            let values: Vec<String> = raw_values
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            if values.is_empty() {
                tracing::warn!(field = %field, "enum entry has no string values; skipping");
                continue;
            }
            fields.promote_to_enum(field, EnumValues::new(values)?)?;
        }
    }
    Ok(fields)
}
