//! # query-forge-backend
//!
//! Backend-agnostic seams between the core IR and the concrete stores:
//! the extractor/translator/executor traits, the `Plan` and `QueryResult`
//! exchange types, and the backend error taxonomy.
//!
//! Concrete implementations live in `query-forge-elastic` and
//! `query-forge-mongo`; the orchestrator in `query-forge-ai` is generic
//! over these traits.

pub mod error;
pub mod plan;
pub mod result;
pub mod traits;

pub use error::{BackendError, TranslationError};
pub use plan::{Plan, PlanTarget};
pub use result::QueryResult;
pub use traits::{QueryExecutor, QueryTranslator, SchemaExtractor, TranslateOptions};
