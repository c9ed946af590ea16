//! Validation and canonicalization of untyped filter documents.
//!
//! A pipeline of pure checks over raw `serde_json::Value`: structural
//! shape, field membership, operator legality, value shapes, then the
//! slice-level auto-corrections. The first irrecoverable violation wins;
//! auto-corrections never fail, they are recorded as warnings instead.

use serde_json::Value;

use crate::error::ValidationError;
use crate::filter::{Aggregation, Condition, FilterSet, Slice, SortKey, SortOrder};
use crate::registry::{is_iso_date, parse_date};
use crate::schema::legal_operators;
use crate::types::{
    AggregateKind, FieldKind, FieldMap, FieldPath, FieldSpec, HavingOperator, Interval, Operator,
};

/// Upstream callers occasionally emit this placeholder instead of
/// omitting the condition; such conditions are dropped defensively.
const SENTINEL_FIELD: &str = "null";

/// A canonicalized IR document plus the auto-correction warnings that
/// were applied while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub filters: FilterSet,
    pub warnings: Vec<String>,
}

pub(crate) fn validate_document(
    fields: &FieldMap,
    raw: &Value,
) -> Result<Validated, ValidationError> {
    let top = raw.as_object().ok_or_else(|| {
        ValidationError::bad_value_shape("", "top level must be an object with a 'filters' array")
    })?;
    let slices_raw = top
        .get("filters")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::bad_value_shape("/filters", "'filters' must be an array"))?;
    if slices_raw.is_empty() {
        return Err(ValidationError::bad_value_shape(
            "/filters",
            "'filters' must contain at least one slice",
        ));
    }

    let mut warnings = Vec::new();
    let mut slices = Vec::with_capacity(slices_raw.len());
    for (i, raw_slice) in slices_raw.iter().enumerate() {
        let path = format!("/filters/{i}");
        slices.push(validate_slice(fields, raw_slice, &path, &mut warnings)?);
    }

    Ok(Validated {
        filters: FilterSet::new(slices),
        warnings,
    })
}

fn validate_slice(
    fields: &FieldMap,
    raw: &Value,
    path: &str,
    warnings: &mut Vec<String>,
) -> Result<Slice, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::bad_value_shape(path, "slice must be an object"))?;

    let mut slice = Slice::new();

    if let Some(raw_conditions) = obj.get("conditions") {
        let list = raw_conditions.as_array().ok_or_else(|| {
            ValidationError::bad_value_shape(
                format!("{path}/conditions"),
                "'conditions' must be an array",
            )
        })?;
        for (i, raw_condition) in list.iter().enumerate() {
            let cpath = format!("{path}/conditions/{i}");
            if let Some(condition) = validate_condition(fields, raw_condition, &cpath, warnings)? {
                slice.conditions.push(condition);
            }
        }
    }

    if let Some(raw_sort) = obj.get("sort") {
        slice.sort = validate_sort(fields, raw_sort, path, warnings)?;
    }

    if let Some(raw_limit) = obj.get("limit") {
        let lpath = format!("{path}/limit");
        let limit = raw_limit.as_u64().ok_or_else(|| {
            ValidationError::bad_value_shape(&lpath, "'limit' must be a positive integer")
        })?;
        if limit == 0 {
            return Err(ValidationError::bad_value_shape(
                &lpath,
                "'limit' must be greater than zero",
            ));
        }
        slice.limit = Some(limit);
    }

    if let Some(raw_group) = obj.get("group_by") {
        slice.group_by = validate_group_by(fields, raw_group, path, warnings)?;
    }

    if let Some(raw_interval) = obj.get("interval") {
        let ipath = format!("{path}/interval");
        let name = raw_interval.as_str().ok_or_else(|| {
            ValidationError::bad_value_shape(&ipath, "'interval' must be a string")
        })?;
        let interval = Interval::parse(name).ok_or_else(|| {
            ValidationError::bad_value_shape(
                &ipath,
                format!("unknown interval '{name}': expected day, week, month, or year"),
            )
        })?;
        slice.interval = Some(interval);
    }

    if let Some(raw_aggs) = obj.get("aggregations") {
        let list = raw_aggs.as_array().ok_or_else(|| {
            ValidationError::bad_value_shape(
                format!("{path}/aggregations"),
                "'aggregations' must be an array",
            )
        })?;
        for (i, raw_agg) in list.iter().enumerate() {
            let apath = format!("{path}/aggregations/{i}");
            slice
                .aggregations
                .push(validate_aggregation(fields, raw_agg, &apath)?);
        }
    }

    apply_corrections(fields, &mut slice, path, warnings);
    Ok(slice)
}

fn validate_condition(
    fields: &FieldMap,
    raw: &Value,
    path: &str,
    warnings: &mut Vec<String>,
) -> Result<Option<Condition>, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::bad_value_shape(path, "condition must be an object"))?;

    let field = obj
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::bad_value_shape(path, "condition is missing 'field'"))?;

    if field == SENTINEL_FIELD {
        tracing::debug!(path, "dropping condition with sentinel field");
        warnings.push(format!("dropped condition with sentinel field at {path}"));
        return Ok(None);
    }

    let field_path = FieldPath::parse(field)
        .map_err(|e| ValidationError::unknown_field(path, e.to_string()))?;
    let spec = fields.spec(field).ok_or_else(|| {
        ValidationError::unknown_field(path, format!("'{field}' is not a queryable field"))
    })?;

    let op_name = obj
        .get("operator")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::bad_value_shape(path, "condition is missing 'operator'"))?;
    let operator = Operator::parse(op_name).ok_or_else(|| {
        ValidationError::illegal_operator(path, format!("unknown operator '{op_name}'"))
    })?;
    if !legal_operators(spec.kind).contains(&operator) {
        return Err(ValidationError::illegal_operator(
            path,
            format!("'{operator}' is not legal for {} fields", spec.kind),
        ));
    }

    let value = obj
        .get("value")
        .ok_or_else(|| ValidationError::bad_value_shape(path, "condition is missing 'value'"))?;
    check_value_shape(spec, operator, value, path, field)?;

    Ok(Some(Condition::new(field_path, operator, value.clone())))
}

fn check_value_shape(
    spec: &FieldSpec,
    operator: Operator,
    value: &Value,
    path: &str,
    field: &str,
) -> Result<(), ValidationError> {
    let vpath = format!("{path}/value");
    match operator {
        Operator::Between => {
            let pair = value.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                ValidationError::bad_value_shape(
                    &vpath,
                    "'between' requires a two-element [lo, hi] list",
                )
            })?;
            check_scalar(spec, &pair[0], &vpath, field)?;
            check_scalar(spec, &pair[1], &vpath, field)?;
            if !pair_is_ordered(spec.kind, &pair[0], &pair[1]) {
                return Err(ValidationError::bad_value_shape(
                    &vpath,
                    "'between' bounds must satisfy lo <= hi",
                ));
            }
            Ok(())
        }
        Operator::IsIn | Operator::NotIn => {
            let list = value.as_array().filter(|a| !a.is_empty()).ok_or_else(|| {
                ValidationError::bad_value_shape(
                    &vpath,
                    format!("'{operator}' requires a non-empty list"),
                )
            })?;
            for element in list {
                check_scalar(spec, element, &vpath, field)?;
            }
            Ok(())
        }
        Operator::Contains => {
            if !value.is_string() {
                return Err(ValidationError::bad_value_shape(
                    &vpath,
                    "'contains' requires a string value",
                ));
            }
            Ok(())
        }
        Operator::Exists => {
            if !value.is_boolean() {
                return Err(ValidationError::bad_value_shape(
                    &vpath,
                    "'exists' requires a boolean value",
                ));
            }
            Ok(())
        }
        Operator::Lt | Operator::Gt | Operator::Is | Operator::Different => {
            check_scalar(spec, value, &vpath, field)
        }
    }
}

/// Checks one scalar against the field's kind: numbers for number
/// fields, ISO-8601 strings for dates, strings for string fields,
/// booleans for boolean fields, and enum membership for enum fields.
fn check_scalar(
    spec: &FieldSpec,
    value: &Value,
    path: &str,
    field: &str,
) -> Result<(), ValidationError> {
    match spec.kind {
        FieldKind::Number => {
            if !value.is_number() {
                return Err(ValidationError::bad_value_shape(
                    path,
                    format!("'{field}' is a number field; got {value}"),
                ));
            }
        }
        FieldKind::Date => {
            let ok = value.as_str().is_some_and(is_iso_date);
            if !ok {
                return Err(ValidationError::bad_value_shape(
                    path,
                    format!("'{field}' is a date field; expected an ISO-8601 string, got {value}"),
                ));
            }
        }
        FieldKind::String => {
            if !value.is_string() {
                return Err(ValidationError::bad_value_shape(
                    path,
                    format!("'{field}' is a string field; got {value}"),
                ));
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                return Err(ValidationError::bad_value_shape(
                    path,
                    format!("'{field}' is a boolean field; got {value}"),
                ));
            }
        }
        FieldKind::Enum => {
            let literal = value.as_str().ok_or_else(|| {
                ValidationError::bad_value_shape(
                    path,
                    format!("'{field}' is an enum field; got {value}"),
                )
            })?;
            let known = spec
                .values
                .as_ref()
                .is_some_and(|values| values.contains(literal));
            if !known {
                return Err(ValidationError::bad_enum_value(
                    path,
                    format!("'{literal}' is not an allowed value of '{field}'"),
                ));
            }
        }
        // Array and object fields only admit `exists`, which never
        // reaches the scalar check.
        FieldKind::Array | FieldKind::Object => {}
    }
    Ok(())
}

fn pair_is_ordered(kind: FieldKind, lo: &Value, hi: &Value) -> bool {
    match kind {
        FieldKind::Number => match (lo.as_f64(), hi.as_f64()) {
            (Some(a), Some(b)) => a <= b,
            _ => false,
        },
        FieldKind::Date => match (
            lo.as_str().and_then(parse_date),
            hi.as_str().and_then(parse_date),
        ) {
            (Some(a), Some(b)) => a <= b,
            _ => false,
        },
        _ => true,
    }
}

fn validate_sort(
    fields: &FieldMap,
    raw: &Value,
    slice_path: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<SortKey>, ValidationError> {
    let list = raw.as_array().ok_or_else(|| {
        ValidationError::bad_value_shape(format!("{slice_path}/sort"), "'sort' must be an array")
    })?;
    let mut keys = Vec::with_capacity(list.len());
    for (i, entry) in list.iter().enumerate() {
        let spath = format!("{slice_path}/sort/{i}");
        let obj = entry
            .as_object()
            .ok_or_else(|| ValidationError::bad_value_shape(&spath, "sort entry must be an object"))?;
        let field = obj
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::bad_value_shape(&spath, "sort entry is missing 'field'"))?;
        let order = match obj.get("order") {
            None => SortOrder::Asc,
            Some(Value::String(s)) if s == "asc" => SortOrder::Asc,
            Some(Value::String(s)) if s == "desc" => SortOrder::Desc,
            Some(other) => {
                return Err(ValidationError::bad_value_shape(
                    format!("{spath}/order"),
                    format!("sort order must be \"asc\" or \"desc\", got {other}"),
                ));
            }
        };
        // Unknown sort fields are dropped rather than rejected.
        if !fields.contains(field) {
            tracing::debug!(field, path = %spath, "dropping sort key on unknown field");
            warnings.push(format!("dropped sort key on unknown field '{field}' at {spath}"));
            continue;
        }
        let field_path = FieldPath::parse(field)
            .map_err(|e| ValidationError::bad_value_shape(&spath, e.to_string()))?;
        keys.push(SortKey::new(field_path, order));
    }
    Ok(keys)
}

fn validate_group_by(
    fields: &FieldMap,
    raw: &Value,
    slice_path: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<FieldPath>, ValidationError> {
    let list = raw.as_array().ok_or_else(|| {
        ValidationError::bad_value_shape(
            format!("{slice_path}/group_by"),
            "'group_by' must be an array of field paths",
        )
    })?;
    let mut groups: Vec<FieldPath> = Vec::with_capacity(list.len());
    for (i, entry) in list.iter().enumerate() {
        let gpath = format!("{slice_path}/group_by/{i}");
        let field = entry.as_str().ok_or_else(|| {
            ValidationError::bad_value_shape(&gpath, "group_by entries must be strings")
        })?;
        if !fields.contains(field) {
            return Err(ValidationError::unknown_field(
                &gpath,
                format!("'{field}' is not a queryable field"),
            ));
        }
        let field_path = FieldPath::parse(field)
            .map_err(|e| ValidationError::unknown_field(&gpath, e.to_string()))?;
        if groups.contains(&field_path) {
            tracing::debug!(field, path = %gpath, "deduplicating group_by entry");
            warnings.push(format!("removed duplicate group_by entry '{field}' at {gpath}"));
            continue;
        }
        groups.push(field_path);
    }
    Ok(groups)
}

fn validate_aggregation(
    fields: &FieldMap,
    raw: &Value,
    path: &str,
) -> Result<Aggregation, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::bad_value_shape(path, "aggregation must be an object"))?;

    let field = obj
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::bad_value_shape(path, "aggregation is missing 'field'"))?;
    let spec = fields.spec(field).ok_or_else(|| {
        ValidationError::unknown_field(path, format!("'{field}' is not a queryable field"))
    })?;
    let field_path = FieldPath::parse(field)
        .map_err(|e| ValidationError::unknown_field(path, e.to_string()))?;

    let kind_name = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::bad_value_shape(path, "aggregation is missing 'kind'"))?;
    let kind = AggregateKind::parse(kind_name).ok_or_else(|| {
        ValidationError::bad_value_shape(
            format!("{path}/kind"),
            format!("unknown aggregation kind '{kind_name}'"),
        )
    })?;
    if kind.requires_numeric() && !spec.kind.is_numeric() {
        return Err(ValidationError::illegal_operator(
            path,
            format!("'{kind}' requires a number field; '{field}' is {}", spec.kind),
        ));
    }

    let mut aggregation = Aggregation::new(kind, field_path);

    let raw_op = obj.get("having_operator").filter(|v| !v.is_null());
    let raw_value = obj.get("having_value").filter(|v| !v.is_null());
    match (raw_op, raw_value) {
        (None, None) => {}
        (Some(op), Some(value)) => {
            let hpath = format!("{path}/having_operator");
            let name = op.as_str().ok_or_else(|| {
                ValidationError::bad_having(&hpath, "having_operator must be a string")
            })?;
            let operator = HavingOperator::parse(name).ok_or_else(|| {
                ValidationError::bad_having(&hpath, format!("unknown having operator '{name}'"))
            })?;
            if !is_scalar(value) {
                return Err(ValidationError::bad_having(
                    format!("{path}/having_value"),
                    "having_value must be a scalar",
                ));
            }
            aggregation = aggregation.with_having(operator, value.clone());
        }
        _ => {
            return Err(ValidationError::bad_having(
                path,
                "having_operator and having_value must be set together",
            ));
        }
    }

    Ok(aggregation)
}

fn is_scalar(value: &Value) -> bool {
    value.is_string() || value.is_number() || value.is_boolean()
}

/// The slice-level auto-corrections: none of these raise, all of them
/// leave a warning behind.
fn apply_corrections(fields: &FieldMap, slice: &mut Slice, path: &str, warnings: &mut Vec<String>) {
    if !slice.aggregations.is_empty() && slice.group_by.is_empty() {
        tracing::debug!(path, "clearing aggregations without group_by");
        warnings.push(format!("removed aggregations without group_by at {path}"));
        slice.aggregations.clear();
    }

    if slice.interval.is_some() {
        let has_date_group = slice.group_by.iter().any(|g| {
            fields
                .spec(&g.as_dotted())
                .is_some_and(|spec| spec.kind == FieldKind::Date)
        });
        if !has_date_group {
            tracing::debug!(path, "clearing interval without a date group field");
            warnings.push(format!(
                "removed interval: no date field in group_by at {path}"
            ));
            slice.interval = None;
        }
    }
}
