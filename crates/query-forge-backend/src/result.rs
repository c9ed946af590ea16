use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The uniform result of executing one plan, regardless of backend.
///
/// Per-slice failures are values, not errors: a failed slice carries
/// `success = false` and the backend's message, so the other slices of a
/// comparison query still come back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub total_hits: u64,
    pub documents: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl QueryResult {
    /// A successful result with hits and optional aggregation output.
    pub fn success(total_hits: u64, documents: Vec<Value>, aggregations: Option<Value>) -> Self {
        Self {
            total_hits,
            documents,
            aggregations,
            success: true,
            error: None,
            metadata: BTreeMap::new(),
        }
    }

    /// A failed slice: no data, the backend's message preserved.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            total_hits: 0,
            documents: Vec::new(),
            aggregations: None,
            success: false,
            error: Some(message.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches a metadata entry, returning self for chaining.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}
