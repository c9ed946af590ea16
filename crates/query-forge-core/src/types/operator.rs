use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of condition operators the IR understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "different")]
    Different,
    #[serde(rename = "isin")]
    IsIn,
    #[serde(rename = "notin")]
    NotIn,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "exists")]
    Exists,
}

impl Operator {
    /// All operators, in table order.
    pub const ALL: [Operator; 9] = [
        Operator::Lt,
        Operator::Gt,
        Operator::Is,
        Operator::Different,
        Operator::IsIn,
        Operator::NotIn,
        Operator::Between,
        Operator::Contains,
        Operator::Exists,
    ];

    /// Returns the IR spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Is => "is",
            Self::Different => "different",
            Self::IsIn => "isin",
            Self::NotIn => "notin",
            Self::Between => "between",
            Self::Contains => "contains",
            Self::Exists => "exists",
        }
    }

    /// Parses the IR spelling back into an operator.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comparators legal in a having clause (applied to a computed metric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HavingOperator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "different")]
    Different,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">=")]
    Gte,
}

impl HavingOperator {
    pub const ALL: [HavingOperator; 6] = [
        HavingOperator::Lt,
        HavingOperator::Gt,
        HavingOperator::Is,
        HavingOperator::Different,
        HavingOperator::Lte,
        HavingOperator::Gte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Is => "is",
            Self::Different => "different",
            Self::Lte => "<=",
            Self::Gte => ">=",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }

    /// The comparator spelling used in search-backend bucket scripts.
    pub fn script_op(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Is => "==",
            Self::Different => "!=",
            Self::Lte => "<=",
            Self::Gte => ">=",
        }
    }

    /// The comparator operator used in document-store match stages.
    pub fn doc_op(&self) -> &'static str {
        match self {
            Self::Lt => "$lt",
            Self::Gt => "$gt",
            Self::Is => "$eq",
            Self::Different => "$ne",
            Self::Lte => "$lte",
            Self::Gte => "$gte",
        }
    }
}

impl fmt::Display for HavingOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_parse_roundtrip() {
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
        assert_eq!(Operator::parse("like"), None);
    }

    #[test]
    fn operator_serde_matches_spelling() {
        for op in Operator::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
            let back: Operator = serde_json::from_str(&json).unwrap();
            assert_eq!(back, op);
        }
    }

    #[test]
    fn symbolic_spellings() {
        assert_eq!(
            serde_json::from_str::<Operator>("\"<\"").unwrap(),
            Operator::Lt
        );
        assert_eq!(
            serde_json::from_str::<Operator>("\">\"").unwrap(),
            Operator::Gt
        );
    }

    #[test]
    fn having_parse_roundtrip() {
        for op in HavingOperator::ALL {
            assert_eq!(HavingOperator::parse(op.as_str()), Some(op));
        }
        assert_eq!(HavingOperator::parse("between"), None);
    }

    #[test]
    fn having_script_ops() {
        assert_eq!(HavingOperator::Gt.script_op(), ">");
        assert_eq!(HavingOperator::Is.script_op(), "==");
        assert_eq!(HavingOperator::Different.script_op(), "!=");
        assert_eq!(HavingOperator::Lte.script_op(), "<=");
    }

    #[test]
    fn having_doc_ops() {
        assert_eq!(HavingOperator::Gt.doc_op(), "$gt");
        assert_eq!(HavingOperator::Is.doc_op(), "$eq");
        assert_eq!(HavingOperator::Different.doc_op(), "$ne");
        assert_eq!(HavingOperator::Gte.doc_op(), "$gte");
    }
}
