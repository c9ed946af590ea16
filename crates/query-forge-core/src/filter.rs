use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AggregateKind, FieldPath, HavingOperator, Interval, Operator};

// ---------------------------------------------------------------------------
// SortOrder / SortKey
// ---------------------------------------------------------------------------

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One sort clause; ties between keys break by order of appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: FieldPath,
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(field: FieldPath, order: SortOrder) -> Self {
        Self { field, order }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.order)
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// One predicate over one field. Conditions within a slice are AND-joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: FieldPath,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: FieldPath, operator: Operator, value: Value) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// A metric computed at the innermost grouping level, optionally gated by
/// a having comparison on its own value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub field: FieldPath,
    pub kind: AggregateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having_operator: Option<HavingOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having_value: Option<Value>,
}

impl Aggregation {
    pub fn new(kind: AggregateKind, field: FieldPath) -> Self {
        Self {
            field,
            kind,
            having_operator: None,
            having_value: None,
        }
    }

    /// Attaches a having comparison to this metric.
    pub fn with_having(mut self, operator: HavingOperator, value: Value) -> Self {
        self.having_operator = Some(operator);
        self.having_value = Some(value);
        self
    }

    /// The metric's name in plans and results:
    /// `{kind}_{dotted_path_with_underscores}`.
    pub fn metric_name(&self) -> String {
        format!("{}_{}", self.kind, self.field.underscored())
    }

    /// The having pair, when both halves are present.
    pub fn having(&self) -> Option<(HavingOperator, &Value)> {
        match (self.having_operator, &self.having_value) {
            (Some(op), Some(v)) => Some((op, v)),
            _ => None,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.field)?;
        if let Some((op, v)) = self.having() {
            write!(f, " having {op} {v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Slice
// ---------------------------------------------------------------------------

/// One unit of query within an IR document.
///
/// Slices are AND-internal and become independent backend plans, which is
/// how side-by-side comparison queries are expressed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Slice {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Grouping fields, outermost first. Order is significant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<FieldPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<Aggregation>,
}

impl Slice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_sort(mut self, field: FieldPath, order: SortOrder) -> Self {
        self.sort.push(SortKey::new(field, order));
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_group(mut self, field: FieldPath) -> Self {
        self.group_by.push(field);
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    /// True when nothing at all was requested for this slice.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.sort.is_empty()
            && self.limit.is_none()
            && self.group_by.is_empty()
            && self.interval.is_none()
            && self.aggregations.is_empty()
    }

    /// True when the slice produces grouping buckets.
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FilterSet
// ---------------------------------------------------------------------------

/// The canonical filter IR: a non-empty, ordered list of slices.
///
/// Serializes as `{"filters": [...]}`, the wire shape the external model
/// produces and the validator canonicalizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(rename = "filters")]
    pub slices: Vec<Slice>,
}

impl FilterSet {
    pub fn new(slices: Vec<Slice>) -> Self {
        Self { slices }
    }

    /// Convenience constructor for the common one-slice case.
    pub fn single(slice: Slice) -> Self {
        Self {
            slices: vec![slice],
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}
