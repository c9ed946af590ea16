//! Document-store implementation of the extractor and executor traits.
//!
//! This is the I/O boundary: all server communication happens here.
//! Pure logic lives in the `sampler` and `pipeline` modules.

use std::collections::BTreeMap;
use std::sync::RwLock;

use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};
use serde_json::json;
use tokio::sync::OnceCell;

use query_forge_backend::error::BackendError;
use query_forge_backend::plan::{Plan, PlanTarget};
use query_forge_backend::result::QueryResult;
use query_forge_backend::traits::{QueryExecutor, SchemaExtractor};
use query_forge_core::error::SchemaError;
use query_forge_core::types::{EnumValues, FieldKind, FieldMap};

use crate::sampler::{document_to_value, field_map_from_documents};

/// Default number of documents sampled for schema inference.
const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Distinct-value cap for category field promotion.
const DISTINCT_LIMIT: usize = 100;

/// Document-store backend: schema inference from a random document
/// sample and plan execution through the aggregation framework.
pub struct MongoBackend {
    collection: Collection<Document>,
    collection_name: String,
    sample_size: usize,
    category_fields: Vec<String>,
    fields_to_ignore: Vec<String>,
    field_map: OnceCell<FieldMap>,
    distinct_cache: RwLock<BTreeMap<String, Vec<String>>>,
}

impl MongoBackend {
    /// Connects to the server and binds a database/collection pair.
    pub async fn connect(
        url: &str,
        database: &str,
        collection: &str,
    ) -> Result<Self, BackendError> {
        let client = Client::with_uri_str(url)
            .await
            .map_err(|e| BackendError::Connection {
                message: e.to_string(),
            })?;
        Ok(Self {
            collection: client.database(database).collection::<Document>(collection),
            collection_name: collection.to_string(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            category_fields: Vec::new(),
            fields_to_ignore: Vec::new(),
            field_map: OnceCell::new(),
            distinct_cache: RwLock::new(BTreeMap::new()),
        })
    }

    /// Overrides the sampling window (default 1000 documents).
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
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
        let sample_stage = doc! {"$sample": {"size": self.sample_size as i64}};
        let mut cursor = self
            .collection
            .aggregate(vec![sample_stage])
            .await
            .map_err(|e| SchemaError::Unreachable {
                message: e.to_string(),
            })?;

        let mut sampled = Vec::new();
        while let Some(document) = cursor.try_next().await.map_err(|e| SchemaError::Unreachable {
            message: e.to_string(),
        })? {
            sampled.push(document_to_value(&document));
        }

        let (mut fields, warnings) = field_map_from_documents(&sampled, &self.fields_to_ignore);
        for warning in &warnings {
            tracing::warn!(collection = %self.collection_name, "{warning}");
        }

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
            let values = self.distinct(category, DISTINCT_LIMIT).await?;
            if values.is_empty() {
                tracing::warn!(field = %category, "no distinct values; leaving as string");
                continue;
            }
            fields.promote_to_enum(category, EnumValues::new(values)?)?;
        }

        tracing::info!(
            collection = %self.collection_name,
            sampled = sampled.len(),
            fields = fields.len(),
            "inferred field map"
        );
        Ok(fields)
    }

    async fn fetch_distinct(&self, field: &str, limit: usize) -> Result<Vec<String>, SchemaError> {
        let raw = self
            .collection
            .distinct(field, doc! {})
            .await
            .map_err(|e| SchemaError::Unreachable {
                message: e.to_string(),
            })?;
        let mut values: Vec<String> = raw
            .iter()
            .filter_map(|value| match value {
                Bson::String(s) => Some(s.clone()),
                Bson::Null => None,
                other => Some(other.to_string()),
            })
            .collect();
        values.truncate(limit);
        Ok(values)
    }
}

impl SchemaExtractor for MongoBackend {
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

impl QueryExecutor for MongoBackend {
    async fn execute(&self, plan: &Plan) -> Result<QueryResult, BackendError> {
        if plan.target != PlanTarget::Doc {
            return Err(BackendError::WrongTarget {
                expected: PlanTarget::Doc.to_string(),
                actual: plan.target.to_string(),
            });
        }

        let stages = plan.body["pipeline"]
            .as_array()
            .ok_or_else(|| BackendError::Internal {
                message: "doc plan has no 'pipeline' array".to_string(),
            })?;
        let pipeline = stages
            .iter()
            .map(mongodb::bson::to_document)
            .collect::<Result<Vec<Document>, _>>()
            .map_err(|e| BackendError::Internal {
                message: format!("pipeline stage is not a document: {e}"),
            })?;

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| BackendError::Query {
                message: e.to_string(),
            })?;

        let mut documents = Vec::new();
        while let Some(document) = cursor.try_next().await.map_err(|e| BackendError::Query {
            message: e.to_string(),
        })? {
            documents.push(Bson::Document(document).into_relaxed_extjson());
        }

        let total_hits = documents.len() as u64;
        Ok(QueryResult::success(total_hits, documents, None)
            .with_metadata("backend", json!(PlanTarget::Doc.as_str()))
            .with_metadata("collection", json!(self.collection_name)))
    }
}
