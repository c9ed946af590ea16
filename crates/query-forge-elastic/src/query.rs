//! Pure functions for lowering the canonical filter IR to search-engine
//! query DSL plans.
//!
//! No I/O. No side effects. Translating the same slice twice yields
//! byte-identical JSON.

use serde_json::{json, Map, Value};

use query_forge_backend::error::TranslationError;
use query_forge_backend::plan::Plan;
use query_forge_backend::traits::{QueryTranslator, TranslateOptions};
use query_forge_core::filter::{Aggregation, Condition, FilterSet, Slice};
use query_forge_core::types::{AggregateKind, FieldMap, FieldSpec, Operator};

/// Lowers IR slices to search-engine plans, one per slice, in order.
#[derive(Debug, Clone, Default)]
pub struct ElasticTranslator {
    opts: TranslateOptions,
}

impl ElasticTranslator {
    pub fn new(opts: TranslateOptions) -> Self {
        Self { opts }
    }
}

impl QueryTranslator for ElasticTranslator {
    fn translate(
        &self,
        filters: &FilterSet,
        fields: &FieldMap,
    ) -> Result<Vec<Plan>, TranslationError> {
        filters
            .slices
            .iter()
            .map(|slice| slice_to_plan(slice, fields, &self.opts).map(Plan::search))
            .collect()
    }
}

/// Compiles one slice to a complete search body:
/// `{query, sort?, size?, aggs?}`.
pub fn slice_to_plan(
    slice: &Slice,
    fields: &FieldMap,
    opts: &TranslateOptions,
) -> Result<Value, TranslationError> {
    let mut plan = Map::new();

    let query = if slice.conditions.is_empty() {
        json!({"match_all": {}})
    } else {
        let predicates = slice
            .conditions
            .iter()
            .map(|condition| predicate(condition, fields))
            .collect::<Result<Vec<_>, _>>()?;
        json!({"bool": {"must": predicates}})
    };
    plan.insert("query".to_string(), query);

    if !slice.sort.is_empty() {
        let keys = slice
            .sort
            .iter()
            .map(|key| {
                let dotted = key.field.as_dotted();
                let spec = lookup(fields, &dotted)?;
                Ok(object(
                    exact_field_name(&dotted, spec),
                    json!({"order": key.order.as_str()}),
                ))
            })
            .collect::<Result<Vec<_>, TranslationError>>()?;
        plan.insert("sort".to_string(), Value::Array(keys));
    }

    if slice.is_grouped() {
        // Bucketed plans return everything through aggs; hits are noise.
        plan.insert("size".to_string(), json!(0));
        plan.insert("aggs".to_string(), aggs_clause(slice, fields, opts)?);
    } else if let Some(limit) = slice.limit {
        plan.insert("size".to_string(), json!(limit));
    }

    Ok(Value::Object(plan))
}

/// Lowers one condition to its predicate per the operator table.
pub fn predicate(condition: &Condition, fields: &FieldMap) -> Result<Value, TranslationError> {
    let dotted = condition.field.as_dotted();
    let spec = lookup(fields, &dotted)?;
    let exact = exact_field_name(&dotted, spec);
    let value = &condition.value;

    let clause = match condition.operator {
        Operator::Gt => object("range", object(dotted, json!({"gt": value}))),
        Operator::Lt => object("range", object(dotted, json!({"lt": value}))),
        Operator::Between => {
            let pair = value.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                TranslationError::Unsupported {
                    reason: format!("'between' on '{dotted}' without a [lo, hi] pair"),
                }
            })?;
            object(
                "range",
                object(dotted, json!({"gte": pair[0], "lte": pair[1]})),
            )
        }
        Operator::Is => object("term", object(exact, value.clone())),
        Operator::Different => must_not(object("term", object(exact, value.clone()))),
        Operator::IsIn => object("terms", object(exact, value.clone())),
        Operator::NotIn => must_not(object("terms", object(exact, value.clone()))),
        Operator::Contains => {
            let needle = value.as_str().ok_or_else(|| TranslationError::Unsupported {
                reason: format!("'contains' on '{dotted}' without a string value"),
            })?;
            object(
                "wildcard",
                object(exact, json!({"value": format!("*{}*", escape_wildcard(needle))})),
            )
        }
        Operator::Exists => {
            let present = value.as_bool().ok_or_else(|| TranslationError::Unsupported {
                reason: format!("'exists' on '{dotted}' without a boolean value"),
            })?;
            let exists = json!({"exists": {"field": dotted}});
            if present {
                exists
            } else {
                must_not(exists)
            }
        }
    };
    Ok(clause)
}

/// Builds the nested bucket tree: `group_by_0` is outermost, metrics,
/// document collection, and having selectors sit at the innermost level.
fn aggs_clause(
    slice: &Slice,
    fields: &FieldMap,
    opts: &TranslateOptions,
) -> Result<Value, TranslationError> {
    let mut innermost = Map::new();
    for aggregation in &slice.aggregations {
        innermost.insert(
            aggregation.metric_name(),
            metric_clause(aggregation, fields)?,
        );
    }
    innermost.insert(
        "documents".to_string(),
        json!({"top_hits": {"size": opts.top_hits_size}}),
    );
    for aggregation in &slice.aggregations {
        if let Some((operator, value)) = aggregation.having() {
            let metric = aggregation.metric_name();
            innermost.insert(
                format!("having_{metric}"),
                json!({
                    "bucket_selector": {
                        "buckets_path": {"var_0": metric},
                        "script": format!("params.var_0 {} {}", operator.script_op(), value)
                    }
                }),
            );
        }
    }

    let mut current = innermost;
    for (i, group) in slice.group_by.iter().enumerate().rev() {
        let dotted = group.as_dotted();
        let spec = lookup(fields, &dotted)?;
        let mut level = bucket_clause(&dotted, spec, i == 0, slice, opts);
        level.insert("aggs".to_string(), Value::Object(current));
        current = Map::new();
        current.insert(format!("group_by_{i}"), Value::Object(level));
    }
    Ok(Value::Object(current))
}

/// One bucketing level: a date histogram when the field is a date and an
/// interval is set, a capped terms bucket otherwise.
fn bucket_clause(
    dotted: &str,
    spec: &FieldSpec,
    outermost: bool,
    slice: &Slice,
    opts: &TranslateOptions,
) -> Map<String, Value> {
    use query_forge_core::types::FieldKind;

    let mut level = Map::new();
    match (spec.kind, slice.interval) {
        (FieldKind::Date, Some(interval)) => {
            if outermost && slice.limit.is_some() {
                tracing::debug!(field = dotted, "limit ignored on date-histogram buckets");
            }
            level.insert(
                "date_histogram".to_string(),
                json!({
                    "field": dotted,
                    "calendar_interval": interval.calendar_interval(),
                    "format": interval.search_format()
                }),
            );
        }
        _ => {
            let size = if outermost {
                slice.limit.unwrap_or(opts.bucket_size as u64)
            } else {
                opts.bucket_size as u64
            };
            level.insert(
                "terms".to_string(),
                json!({"field": exact_field_name(dotted, spec), "size": size}),
            );
        }
    }
    level
}

/// One metric at the innermost level. `count` lowers to `value_count`
/// and follows the exact-match rewrite so it can count keyword terms.
fn metric_clause(aggregation: &Aggregation, fields: &FieldMap) -> Result<Value, TranslationError> {
    let dotted = aggregation.field.as_dotted();
    let spec = lookup(fields, &dotted)?;
    let field_name = if aggregation.kind == AggregateKind::Count {
        exact_field_name(&dotted, spec)
    } else {
        dotted
    };
    Ok(object(
        aggregation.kind.search_op(),
        json!({"field": field_name}),
    ))
}

/// The spelling equality lookups use: `f.keyword` for exact-match
/// fields, the raw dotted path otherwise.
fn exact_field_name(dotted: &str, spec: &FieldSpec) -> String {
    if spec.exact_match {
        format!("{dotted}.keyword")
    } else {
        dotted.to_string()
    }
}

fn lookup<'a>(fields: &'a FieldMap, dotted: &str) -> Result<&'a FieldSpec, TranslationError> {
    fields.spec(dotted).ok_or_else(|| TranslationError::UnknownField {
        field: dotted.to_string(),
    })
}

/// Lowercases and escapes wildcard metacharacters for a wildcard query.
fn escape_wildcard(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.to_lowercase().chars() {
        if matches!(c, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn object(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

fn must_not(clause: Value) -> Value {
    json!({"bool": {"must_not": [clause]}})
}
