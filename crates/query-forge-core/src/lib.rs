//! # query-forge-core
//!
//! The database-agnostic heart of QueryForge: the normalized schema
//! model, the typed filter IR, and the validator that canonicalizes what
//! an external language model produced into something the backend
//! translators can lower deterministically.
//!
//! This crate does no I/O. Backends feed it metadata (`FieldMap`) and raw
//! IR documents; it hands back canonical `FilterSet` values and the
//! prompt descriptor the model is briefed with.
//!
//! # Example
//!
//! ```
//! use query_forge_core::schema::FilterSchema;
//! use query_forge_core::types::{FieldKind, FieldMap, FieldSpec};
//! use serde_json::json;
//!
//! let mut fields = FieldMap::new();
//! fields.insert("amount", FieldSpec::new(FieldKind::Number)).unwrap();
//! let schema = FilterSchema::new(fields).unwrap();
//!
//! let validated = schema
//!     .validate(&json!({
//!         "filters": [
//!             {"conditions": [{"field": "amount", "operator": ">", "value": 100}]}
//!         ]
//!     }))
//!     .unwrap();
//! assert_eq!(validated.filters.len(), 1);
//! assert!(validated.warnings.is_empty());
//! ```

pub mod error;
pub mod filter;
pub mod registry;
pub mod schema;
pub mod types;
mod validate;

pub use error::{SchemaError, ValidationError, ValidationErrorKind};
pub use filter::{Aggregation, Condition, FilterSet, Slice, SortKey, SortOrder};
pub use schema::{FieldDescriptor, FilterSchema, PromptDescriptor};
pub use validate::Validated;
