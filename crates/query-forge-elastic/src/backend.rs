//! Search-engine implementation of the extractor and executor traits.
//!
//! This is the I/O boundary: all cluster communication happens here.
//! Pure logic lives in the `mapping` and `query` modules.

use std::collections::BTreeMap;
use std::sync::RwLock;

use elasticsearch::http::transport::Transport;
use elasticsearch::indices::IndicesGetMappingParts;
use elasticsearch::{Elasticsearch, SearchParts};
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use query_forge_backend::error::BackendError;
use query_forge_backend::plan::{Plan, PlanTarget};
use query_forge_backend::result::QueryResult;
use query_forge_backend::traits::{QueryExecutor, SchemaExtractor};
use query_forge_core::error::SchemaError;
use query_forge_core::types::{EnumValues, FieldKind, FieldMap};

use crate::mapping::{field_map_from_properties, properties_from_mapping_response};

/// Default distinct-value cap for category field promotion.
const DEFAULT_DISTINCT_SIZE: usize = 100;

/// Search-engine backend: schema extraction from the index mapping and
/// plan execution through the `_search` API.
///
/// The field map and distinct sets are populated once and then read
/// lock-free; concurrent orchestrator calls share them safely.
pub struct ElasticBackend {
    client: Elasticsearch,
    index: String,
    category_fields: Vec<String>,
    fields_to_ignore: Vec<String>,
    distinct_size: usize,
    field_map: OnceCell<FieldMap>,
    distinct_cache: RwLock<BTreeMap<String, Vec<String>>>,
}

impl ElasticBackend {
    /// Connects to a single-node cluster URL.
    pub fn connect(url: &str, index: impl Into<String>) -> Result<Self, BackendError> {
        let transport = Transport::single_node(url).map_err(|e| BackendError::Connection {
            message: e.to_string(),
        })?;
        Ok(Self {
            client: Elasticsearch::new(transport),
            index: index.into(),
            category_fields: Vec::new(),
            fields_to_ignore: Vec::new(),
            distinct_size: DEFAULT_DISTINCT_SIZE,
            field_map: OnceCell::new(),
            distinct_cache: RwLock::new(BTreeMap::new()),
        })
    }

    /// Fields whose distinct values should be collected and promoted to
    /// enums.
    pub fn with_category_fields(mut self, fields: Vec<String>) -> Self {
        self.category_fields = fields;
        self
    }

    /// Fields (and their subtrees) to drop from the schema.
    pub fn with_fields_to_ignore(mut self, fields: Vec<String>) -> Self {
        self.fields_to_ignore = fields;
        self
    }

    async fn fetch_field_map(&self) -> Result<FieldMap, SchemaError> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[&self.index]))
            .send()
            .await
            .map_err(|e| SchemaError::Unreachable {
                message: e.to_string(),
            })?;
        let body: Value = response.json().await.map_err(|e| SchemaError::Unreachable {
            message: e.to_string(),
        })?;

        let properties = properties_from_mapping_response(&self.index, &body).ok_or_else(|| {
            SchemaError::MalformedMapping {
                reason: format!("no mapping properties found for index '{}'", self.index),
            }
        })?;
        let walk = field_map_from_properties(properties, &self.fields_to_ignore)?;
        for warning in &walk.warnings {
            tracing::warn!(index = %self.index, "{warning}");
        }

        let mut fields = walk.fields;
        for category in &self.category_fields {
            let is_string = fields
                .spec(category)
                .is_some_and(|spec| spec.kind == FieldKind::String);
            if !is_string {
                tracing::warn!(
                    field = %category,
                    "category field is not a string field; skipping enum promotion"
                );
                continue;
            }
            let values = self.distinct(category, self.distinct_size).await?;
            if values.is_empty() {
                tracing::warn!(field = %category, "no distinct values; leaving as string");
                continue;
            }
            fields.promote_to_enum(category, EnumValues::new(values)?)?;
        }

        tracing::info!(index = %self.index, fields = fields.len(), "extracted field map");
        Ok(fields)
    }

    async fn fetch_distinct(&self, field: &str, limit: usize) -> Result<Vec<String>, SchemaError> {
        let request = json!({
            "size": 0,
            "aggs": {
                "distinct_values": {
                    "terms": {"field": format!("{field}.keyword"), "size": limit}
                }
            }
        });
        let response = self
            .client
            .search(SearchParts::Index(&[&self.index]))
            .body(request)
            .send()
            .await
            .map_err(|e| SchemaError::Unreachable {
                message: e.to_string(),
            })?;
        let body: Value = response.json().await.map_err(|e| SchemaError::Unreachable {
            message: e.to_string(),
        })?;

        let buckets = body["aggregations"]["distinct_values"]["buckets"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let values = buckets
            .iter()
            .filter_map(|bucket| bucket.get("key"))
            .map(|key| match key {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        Ok(values)
    }
}

impl SchemaExtractor for ElasticBackend {
    async fn extract(&self) -> Result<FieldMap, SchemaError> {
        self.field_map
            .get_or_try_init(|| self.fetch_field_map())
            .await
            .cloned()
    }

    async fn distinct(&self, field: &str, limit: usize) -> Result<Vec<String>, SchemaError> {
        if let Ok(cache) = self.distinct_cache.read() {
            if let Some(hit) = cache.get(field) {
                return Ok(hit.clone());
            }
        }
        let values = self.fetch_distinct(field, limit).await?;
        if let Ok(mut cache) = self.distinct_cache.write() {
            cache.insert(field.to_string(), values.clone());
        }
        Ok(values)
    }
}

impl QueryExecutor for ElasticBackend {
    async fn execute(&self, plan: &Plan) -> Result<QueryResult, BackendError> {
        if plan.target != PlanTarget::Search {
            return Err(BackendError::WrongTarget {
                expected: PlanTarget::Search.to_string(),
                actual: plan.target.to_string(),
            });
        }

        let response = self
            .client
            .search(SearchParts::Index(&[&self.index]))
            .body(plan.body.clone())
            .send()
            .await
            .map_err(|e| BackendError::Connection {
                message: e.to_string(),
            })?;

        let status = response.status_code();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|e| format!("unreadable error body: {e}"));
            return Err(BackendError::Query {
                message: format!("search failed with status {status}: {detail}"),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse {
                message: e.to_string(),
            })?;

        let total_hits = body["hits"]["total"]["value"].as_u64().unwrap_or(0);
        let documents = body["hits"]["hits"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit.get("_source"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let aggregations = body.get("aggregations").cloned();

        Ok(
            QueryResult::success(total_hits, documents, aggregations)
                .with_metadata("backend", json!(PlanTarget::Search.as_str()))
                .with_metadata("index", json!(self.index))
                .with_metadata("took_ms", body.get("took").cloned().unwrap_or(Value::Null)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_builds_a_client() {
        let backend = ElasticBackend::connect("http://localhost:9200", "transactions").unwrap();
        assert_eq!(backend.index, "transactions");
        assert_eq!(backend.distinct_size, 100);
    }

    #[test]
    fn builders_accumulate() {
        let backend = ElasticBackend::connect("http://localhost:9200", "transactions")
            .unwrap()
            .with_category_fields(vec!["card_type".into()])
            .with_fields_to_ignore(vec!["internal".into()]);
        assert_eq!(backend.category_fields, ["card_type"]);
        assert_eq!(backend.fields_to_ignore, ["internal"]);
    }

    #[tokio::test]
    async fn executor_refuses_doc_plans() {
        let backend = ElasticBackend::connect("http://localhost:9200", "transactions").unwrap();
        let err = backend
            .execute(&Plan::doc(json!({"pipeline": []})))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::WrongTarget { .. }));
    }
}
