//! Pure functions for lowering the canonical filter IR to document-store
//! aggregation pipelines.
//!
//! Stage order is fixed: `$match` (conditions), `$group`, `$match`
//! (having), `$sort`, `$limit`; absent inputs produce absent stages. No
//! I/O, deterministic output.

use serde_json::{json, Map, Value};

use query_forge_backend::error::TranslationError;
use query_forge_backend::plan::Plan;
use query_forge_backend::traits::{QueryTranslator, TranslateOptions};
use query_forge_core::filter::{Condition, FilterSet, Slice, SortOrder};
use query_forge_core::types::{AggregateKind, FieldKind, FieldMap, Operator};

/// Lowers IR slices to aggregation-pipeline plans, one per slice, in
/// order.
#[derive(Debug, Clone, Default)]
pub struct MongoTranslator {
    #[allow(dead_code)]
    opts: TranslateOptions,
}

impl MongoTranslator {
    pub fn new(opts: TranslateOptions) -> Self {
        Self { opts }
    }
}

impl QueryTranslator for MongoTranslator {
    fn translate(
        &self,
        filters: &FilterSet,
        fields: &FieldMap,
    ) -> Result<Vec<Plan>, TranslationError> {
        filters
            .slices
            .iter()
            .map(|slice| {
                slice_to_pipeline(slice, fields)
                    .map(|stages| Plan::doc(json!({"pipeline": stages})))
            })
            .collect()
    }
}

/// Compiles one slice to its ordered pipeline stages.
pub fn slice_to_pipeline(slice: &Slice, fields: &FieldMap) -> Result<Vec<Value>, TranslationError> {
    let mut stages = Vec::new();

    if !slice.conditions.is_empty() {
        stages.push(object("$match", match_clause(&slice.conditions, fields)?));
    }

    if slice.is_grouped() {
        stages.push(object("$group", group_clause(slice, fields)?));
        if let Some(having) = having_clause(slice) {
            stages.push(object("$match", having));
        }
    }

    if !slice.sort.is_empty() {
        let mut sort = Map::new();
        for key in &slice.sort {
            let direction = match key.order {
                SortOrder::Asc => 1,
                SortOrder::Desc => -1,
            };
            sort.insert(key.field.as_dotted(), json!(direction));
        }
        stages.push(object("$sort", Value::Object(sort)));
    }

    if let Some(limit) = slice.limit {
        // $limit sits after $group, so on grouped plans it caps buckets.
        stages.push(object("$limit", json!(limit)));
    }

    Ok(stages)
}

/// AND-joins condition predicates: one condition inlines, several go
/// under `$and` (two conditions on the same field would otherwise
/// collide as duplicate document keys).
fn match_clause(conditions: &[Condition], fields: &FieldMap) -> Result<Value, TranslationError> {
    let mut predicates = conditions
        .iter()
        .map(|condition| predicate(condition, fields))
        .collect::<Result<Vec<_>, _>>()?;
    if predicates.len() == 1 {
        Ok(predicates.remove(0))
    } else {
        Ok(json!({"$and": predicates}))
    }
}

/// Lowers one condition to its native comparator document.
pub fn predicate(condition: &Condition, fields: &FieldMap) -> Result<Value, TranslationError> {
    let dotted = condition.field.as_dotted();
    if !fields.contains(&dotted) {
        return Err(TranslationError::UnknownField { field: dotted });
    }
    let value = &condition.value;

    let comparison = match condition.operator {
        Operator::Gt => json!({"$gt": value}),
        Operator::Lt => json!({"$lt": value}),
        Operator::Between => {
            let pair = value.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                TranslationError::Unsupported {
                    reason: format!("'between' on '{dotted}' without a [lo, hi] pair"),
                }
            })?;
            json!({"$gte": pair[0], "$lte": pair[1]})
        }
        Operator::Is => json!({"$eq": value}),
        Operator::Different => json!({"$ne": value}),
        Operator::IsIn => json!({"$in": value}),
        Operator::NotIn => json!({"$nin": value}),
        Operator::Contains => {
            let needle = value.as_str().ok_or_else(|| TranslationError::Unsupported {
                reason: format!("'contains' on '{dotted}' without a string value"),
            })?;
            json!({"$regex": escape_regex(needle), "$options": "i"})
        }
        Operator::Exists => {
            let present = value.as_bool().ok_or_else(|| TranslationError::Unsupported {
                reason: format!("'exists' on '{dotted}' without a boolean value"),
            })?;
            json!({"$exists": present})
        }
    };
    Ok(object(dotted, comparison))
}

/// One `$group` stage: a compound `_id` keyed by underscored field
/// spelling, a push-all-root document collection, and one accumulator
/// per aggregation.
fn group_clause(slice: &Slice, fields: &FieldMap) -> Result<Value, TranslationError> {
    let mut id = Map::new();
    for group in &slice.group_by {
        let dotted = group.as_dotted();
        let spec = fields
            .spec(&dotted)
            .ok_or_else(|| TranslationError::UnknownField {
                field: dotted.clone(),
            })?;
        let expr = match (spec.kind, slice.interval) {
            (FieldKind::Date, Some(interval)) => json!({
                "$dateToString": {
                    "format": interval.doc_format(),
                    "date": format!("${dotted}")
                }
            }),
            _ => json!(format!("${dotted}")),
        };
        id.insert(group.underscored(), expr);
    }

    let mut group = Map::new();
    group.insert("_id".to_string(), Value::Object(id));
    group.insert("documents".to_string(), json!({"$push": "$$ROOT"}));
    for aggregation in &slice.aggregations {
        let dotted = aggregation.field.as_dotted();
        if !fields.contains(&dotted) {
            return Err(TranslationError::UnknownField { field: dotted });
        }
        let accumulator = if aggregation.kind == AggregateKind::Count {
            json!({"$sum": 1})
        } else {
            object(aggregation.kind.doc_op(), json!(format!("${dotted}")))
        };
        group.insert(aggregation.metric_name(), accumulator);
    }
    Ok(Value::Object(group))
}

/// The post-group `$match` comparing accumulator names; absent when no
/// aggregation carries a having pair.
fn having_clause(slice: &Slice) -> Option<Value> {
    let mut clause = Map::new();
    for aggregation in &slice.aggregations {
        if let Some((operator, value)) = aggregation.having() {
            clause.insert(
                aggregation.metric_name(),
                object(operator.doc_op(), value.clone()),
            );
        }
    }
    if clause.is_empty() {
        None
    } else {
        Some(Value::Object(clause))
    }
}

/// Escapes regex metacharacters so `contains` matches literally.
fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use query_forge_core::filter::Aggregation;
    use query_forge_core::types::{
        EnumValues, FieldPath, FieldSpec, HavingOperator, Interval,
    };

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    fn fields() -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("t.amt", FieldSpec::new(FieldKind::Number)).unwrap();
        map.insert("t.ts", FieldSpec::new(FieldKind::Date)).unwrap();
        map.insert("t.id", FieldSpec::new(FieldKind::String)).unwrap();
        map.insert("t.cur", FieldSpec::new(FieldKind::String)).unwrap();
        map.insert("t.loc", FieldSpec::new(FieldKind::String)).unwrap();
        map.insert("flagged", FieldSpec::new(FieldKind::Boolean)).unwrap();
        map.insert("tags", FieldSpec::array(FieldKind::String)).unwrap();
        map.insert(
            "card_type",
            FieldSpec::enumeration(EnumValues::new(vec!["GOLD".into(), "SILVER".into()]).unwrap()),
        )
        .unwrap();
        map
    }

    #[test]
    fn empty_slice_is_an_empty_pipeline() {
        let stages = slice_to_pipeline(&Slice::new(), &fields()).unwrap();
        assert!(stages.is_empty());
        let translator = MongoTranslator::default();
        let plans = translator
            .translate(&FilterSet::single(Slice::new()), &fields())
            .unwrap();
        assert_eq!(plans[0].body, json!({"pipeline": []}));
    }

    #[test]
    fn equality_needs_no_suffix_rewrite() {
        // Seed scenario: enum equality lowers to a plain $eq match.
        let slice = Slice::new().with_condition(Condition::new(
            path("card_type"),
            Operator::Is,
            json!("GOLD"),
        ));
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        assert_eq!(
            stages[0],
            json!({"$match": {"card_type": {"$eq": "GOLD"}}})
        );
    }

    #[test]
    fn between_on_date_lowers_to_gte_lte() {
        // Seed scenario: date between.
        let slice = Slice::new().with_condition(Condition::new(
            path("t.ts"),
            Operator::Between,
            json!(["2024-01-01", "2024-12-31"]),
        ));
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        assert_eq!(
            stages[0],
            json!({"$match": {"t.ts": {"$gte": "2024-01-01", "$lte": "2024-12-31"}}})
        );
    }

    #[test]
    fn comparator_table() {
        let cases = [
            (Operator::Gt, json!(5), json!({"$gt": 5})),
            (Operator::Lt, json!(5), json!({"$lt": 5})),
            (Operator::Different, json!(5), json!({"$ne": 5})),
            (Operator::IsIn, json!([1, 2]), json!({"$in": [1, 2]})),
            (Operator::NotIn, json!([1, 2]), json!({"$nin": [1, 2]})),
        ];
        for (operator, value, expected) in cases {
            let condition = Condition::new(path("t.amt"), operator, value);
            assert_eq!(
                predicate(&condition, &fields()).unwrap(),
                object("t.amt".to_string(), expected)
            );
        }
    }

    #[test]
    fn contains_is_case_insensitive_escaped_regex() {
        let condition = Condition::new(path("t.id"), Operator::Contains, json!("a.b*c"));
        assert_eq!(
            predicate(&condition, &fields()).unwrap(),
            json!({"t.id": {"$regex": "a\\.b\\*c", "$options": "i"}})
        );
    }

    #[test]
    fn exists_lowers_to_dollar_exists() {
        let condition = Condition::new(path("tags"), Operator::Exists, json!(false));
        assert_eq!(
            predicate(&condition, &fields()).unwrap(),
            json!({"tags": {"$exists": false}})
        );
    }

    #[test]
    fn multiple_conditions_join_under_and() {
        let slice = Slice::new()
            .with_condition(Condition::new(path("t.amt"), Operator::Gt, json!(10)))
            .with_condition(Condition::new(path("t.amt"), Operator::Lt, json!(100)));
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        assert_eq!(
            stages[0],
            json!({"$match": {"$and": [
                {"t.amt": {"$gt": 10}},
                {"t.amt": {"$lt": 100}}
            ]}})
        );
    }

    #[test]
    fn monthly_sum_with_two_metrics() {
        // Seed scenario: one $group, _id.t_ts via $dateToString "%Y-%m",
        // sum and count accumulators, and a documents push.
        let slice = Slice::new()
            .with_group(path("t.ts"))
            .with_interval(Interval::Month)
            .with_aggregation(Aggregation::new(AggregateKind::Sum, path("t.amt")))
            .with_aggregation(Aggregation::new(AggregateKind::Count, path("t.amt")));
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        assert_eq!(stages.len(), 1);
        let group = &stages[0]["$group"];
        assert_eq!(
            group["_id"]["t_ts"],
            json!({"$dateToString": {"format": "%Y-%m", "date": "$t.ts"}})
        );
        assert_eq!(group["sum_t_amt"], json!({"$sum": "$t.amt"}));
        assert_eq!(group["count_t_amt"], json!({"$sum": 1}));
        assert_eq!(group["documents"], json!({"$push": "$$ROOT"}));
    }

    #[test]
    fn multi_level_grouping_builds_compound_id() {
        // Seed scenario: two grouped fields, min/max metrics.
        let slice = Slice::new()
            .with_group(path("t.cur"))
            .with_group(path("t.loc"))
            .with_aggregation(Aggregation::new(AggregateKind::Min, path("t.amt")))
            .with_aggregation(Aggregation::new(AggregateKind::Max, path("t.amt")));
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        let group = &stages[0]["$group"];
        assert_eq!(
            group["_id"],
            json!({"t_cur": "$t.cur", "t_loc": "$t.loc"})
        );
        assert_eq!(group["min_t_amt"], json!({"$min": "$t.amt"}));
        assert_eq!(group["max_t_amt"], json!({"$max": "$t.amt"}));
    }

    #[test]
    fn having_becomes_a_post_group_match() {
        // Seed scenario: daily count(t.id) > 1.
        let slice = Slice::new()
            .with_group(path("t.ts"))
            .with_interval(Interval::Day)
            .with_aggregation(
                Aggregation::new(AggregateKind::Count, path("t.id"))
                    .with_having(HavingOperator::Gt, json!(1)),
            );
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(
            stages[0]["$group"]["_id"]["t_ts"],
            json!({"$dateToString": {"format": "%Y-%m-%d", "date": "$t.ts"}})
        );
        assert_eq!(stages[1], json!({"$match": {"count_t_id": {"$gt": 1}}}));
    }

    #[test]
    fn stage_order_is_fixed() {
        let slice = Slice::new()
            .with_condition(Condition::new(path("flagged"), Operator::Is, json!(true)))
            .with_group(path("t.cur"))
            .with_aggregation(
                Aggregation::new(AggregateKind::Sum, path("t.amt"))
                    .with_having(HavingOperator::Gte, json!(100)),
            )
            .with_sort(path("t.amt"), SortOrder::Desc)
            .with_limit(10);
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        let stage_names: Vec<&String> = stages
            .iter()
            .map(|stage| stage.as_object().unwrap().keys().next().unwrap())
            .collect();
        assert_eq!(stage_names, ["$match", "$group", "$match", "$sort", "$limit"]);
        assert_eq!(stages[2], json!({"$match": {"sum_t_amt": {"$gte": 100}}}));
        assert_eq!(stages[4], json!({"$limit": 10}));
    }

    #[test]
    fn sort_preserves_key_order() {
        let slice = Slice::new()
            .with_sort(path("t.cur"), SortOrder::Asc)
            .with_sort(path("t.amt"), SortOrder::Desc);
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        let sort = stages[0]["$sort"].as_object().unwrap();
        let keys: Vec<&String> = sort.keys().collect();
        assert_eq!(keys, ["t.cur", "t.amt"]);
        assert_eq!(sort["t.cur"], json!(1));
        assert_eq!(sort["t.amt"], json!(-1));
    }

    #[test]
    fn ungrouped_plan_has_no_group_stage() {
        let slice = Slice::new()
            .with_condition(Condition::new(path("t.amt"), Operator::Gt, json!(0)))
            .with_limit(3);
        let stages = slice_to_pipeline(&slice, &fields()).unwrap();
        assert_eq!(stages.len(), 2);
        assert!(stages.iter().all(|s| s.get("$group").is_none()));
    }

    #[test]
    fn slice_order_is_preserved() {
        let set = FilterSet::new(vec![
            Slice::new().with_condition(Condition::new(path("card_type"), Operator::Is, json!("GOLD"))),
            Slice::new().with_condition(Condition::new(path("card_type"), Operator::Is, json!("SILVER"))),
        ]);
        let translator = MongoTranslator::default();
        let plans = translator.translate(&set, &fields()).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(
            plans[0].body["pipeline"][0]["$match"]["card_type"]["$eq"],
            json!("GOLD")
        );
        assert_eq!(
            plans[1].body["pipeline"][0]["$match"]["card_type"]["$eq"],
            json!("SILVER")
        );
    }

    #[test]
    fn translation_is_deterministic() {
        let slice = Slice::new()
            .with_condition(Condition::new(path("t.cur"), Operator::IsIn, json!(["USD", "EUR"])))
            .with_group(path("t.ts"))
            .with_interval(Interval::Year)
            .with_aggregation(Aggregation::new(AggregateKind::Avg, path("t.amt")))
            .with_sort(path("t.ts"), SortOrder::Asc)
            .with_limit(12);
        let fields = fields();
        let once = serde_json::to_vec(&slice_to_pipeline(&slice, &fields).unwrap()).unwrap();
        let twice = serde_json::to_vec(&slice_to_pipeline(&slice, &fields).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_field_is_a_translation_error() {
        let slice = Slice::new().with_condition(Condition::new(
            path("ghost"),
            Operator::Is,
            json!(1),
        ));
        assert!(matches!(
            slice_to_pipeline(&slice, &fields()),
            Err(TranslationError::UnknownField { .. })
        ));
    }
}
