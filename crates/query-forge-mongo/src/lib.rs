//! # query-forge-mongo
//!
//! Document-store backend for QueryForge:
//! - `sampler` infers the normalized field map from sampled documents
//! - `pipeline` lowers canonical IR slices to aggregation pipelines (pure)
//! - `backend` talks to the server: `$sample` extraction, distinct-value
//!   collection, and pipeline execution

pub mod backend;
pub mod pipeline;
pub mod sampler;

pub use backend::MongoBackend;
pub use pipeline::MongoTranslator;
pub use sampler::{document_to_value, field_map_from_documents, TypeObservations};
