use std::fmt;

use serde::{Deserialize, Serialize};

/// Metric kinds computed inside grouping buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 5] = [
        AggregateKind::Sum,
        AggregateKind::Avg,
        AggregateKind::Count,
        AggregateKind::Min,
        AggregateKind::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// True for kinds that only make sense over numeric fields.
    /// `count` is cardinality-of-non-null and is legal on any kind.
    pub fn requires_numeric(&self) -> bool {
        !matches!(self, Self::Count)
    }

    /// The search backend's metric aggregation name.
    pub fn search_op(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "value_count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// The document store's accumulator operator.
    /// `count` lowers to a sum of 1 per document, handled at the call site.
    pub fn doc_op(&self) -> &'static str {
        match self {
            Self::Sum | Self::Count => "$sum",
            Self::Avg => "$avg",
            Self::Min => "$min",
            Self::Max => "$max",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
