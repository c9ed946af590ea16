use std::future::Future;

use query_forge_core::error::SchemaError;
use query_forge_core::filter::FilterSet;
use query_forge_core::types::FieldMap;

use crate::error::{BackendError, TranslationError};
use crate::plan::Plan;
use crate::result::QueryResult;

/// Tunables shared by both translators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Cardinality cap for non-date grouping buckets.
    pub bucket_size: usize,
    /// Per-bucket document collection cap.
    pub top_hits_size: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            bucket_size: 100,
            top_hits_size: 100,
        }
    }
}

/// Produces the normalized field map (and distinct value sets) from a
/// backing store's metadata.
///
/// Implementations memoize: `extract` runs the backend walk once and
/// serves cached copies afterwards.
///
/// Uses RPITIT (return position impl Trait in trait) for async methods,
/// avoiding the `async-trait` crate.
pub trait SchemaExtractor: Send + Sync {
    /// Builds (or returns the cached) flattened field map.
    fn extract(&self) -> impl Future<Output = Result<FieldMap, SchemaError>> + Send;

    /// Collects up to `limit` distinct values of a field, for enum
    /// promotion of category fields.
    fn distinct(
        &self,
        field: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>, SchemaError>> + Send;
}

/// Compiles a canonical IR into backend plans, one per slice, in slice
/// order. Translation is pure: no I/O, deterministic output.
pub trait QueryTranslator: Send + Sync {
    fn translate(
        &self,
        filters: &FilterSet,
        fields: &FieldMap,
    ) -> Result<Vec<Plan>, TranslationError>;
}

/// Runs one plan against the backing store and shapes the response into
/// the uniform `QueryResult`.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, plan: &Plan) -> impl Future<Output = Result<QueryResult, BackendError>> + Send;
}
