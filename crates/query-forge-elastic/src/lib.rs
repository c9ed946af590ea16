//! # query-forge-elastic
//!
//! Search-engine backend for QueryForge:
//! - `mapping` flattens a `properties` tree into the normalized field map
//! - `query` lowers canonical IR slices to query DSL plans (pure)
//! - `backend` talks to the cluster: mapping extraction, distinct-value
//!   collection, and plan execution

pub mod backend;
pub mod mapping;
pub mod query;

pub use backend::ElasticBackend;
pub use mapping::{field_map_from_properties, properties_of, MappingWalk};
pub use query::ElasticTranslator;
