//! # query-forge-ai
//!
//! The model-facing half of QueryForge: the system prompt and per-schema
//! descriptor rendering, the `FilterModel` seam to whatever LLM client
//! the embedding application brings, and the orchestrator that wires
//! extraction, synthesis, validation, translation, and execution into a
//! single call.

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod prompt;

pub use client::{extract_json, FilterModel};
pub use error::{PipelineError, Stage};
pub use orchestrator::{NoExecutor, Orchestrator, QueryOutcome};
pub use prompt::{render_descriptor, user_prompt, FILTER_SYSTEM_PROMPT};
