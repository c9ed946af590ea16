use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The backend family a plan is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTarget {
    /// Search-engine query DSL.
    Search,
    /// Document-store aggregation pipeline.
    Doc,
}

impl PlanTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for PlanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One backend-native query, serialized as JSON.
///
/// Plans are pure functions of `(IR slice, FieldMap)`: translating the
/// same slice twice yields byte-identical bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub target: PlanTarget,
    pub body: Value,
}

impl Plan {
    pub fn search(body: Value) -> Self {
        Self {
            target: PlanTarget::Search,
            body,
        }
    }

    pub fn doc(body: Value) -> Self {
        Self {
            target: PlanTarget::Doc,
            body,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} plan: {}", self.target, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn target_spellings() {
        assert_eq!(PlanTarget::Search.to_string(), "search");
        assert_eq!(PlanTarget::Doc.to_string(), "doc");
        assert_eq!(serde_json::to_string(&PlanTarget::Doc).unwrap(), "\"doc\"");
    }

    #[test]
    fn plan_roundtrips_through_json() {
        let plan = Plan::search(json!({"query": {"match_all": {}}}));
        let text = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&text).unwrap();
        assert_eq!(plan, back);
    }

    #[test]
    fn constructors_set_target() {
        assert_eq!(Plan::search(json!({})).target, PlanTarget::Search);
        assert_eq!(Plan::doc(json!({"pipeline": []})).target, PlanTarget::Doc);
    }
}
