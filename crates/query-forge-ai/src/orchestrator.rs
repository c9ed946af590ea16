//! The pipeline orchestrator: schema extraction, prompt assembly, model
//! round, validation, translation, and (optionally) execution, behind a
//! single entry point.
//!
//! The orchestrator is an explicit value holding its collaborators; no
//! process-wide state. The filter schema is built once on first use and
//! shared by subsequent calls.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use query_forge_backend::error::BackendError;
use query_forge_backend::plan::Plan;
use query_forge_backend::result::QueryResult;
use query_forge_backend::traits::{QueryExecutor, QueryTranslator, SchemaExtractor};
use query_forge_core::filter::FilterSet;
use query_forge_core::schema::FilterSchema;

use crate::client::{extract_json, FilterModel};
use crate::error::{PipelineError, Stage};
use crate::prompt::{user_prompt, FILTER_SYSTEM_PROMPT};

/// The record returned by one orchestrator call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub natural_language_query: String,
    pub extracted_filters: FilterSet,
    pub database_queries: Vec<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<QueryResult>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Placeholder executor for orchestrators that only plan.
pub struct NoExecutor;

impl QueryExecutor for NoExecutor {
    async fn execute(&self, _plan: &Plan) -> Result<QueryResult, BackendError> {
        Err(BackendError::Internal {
            message: "no executor configured".to_string(),
        })
    }
}

/// Wires extractor, translator, model, and (optionally) executor into
/// the one synchronous entry point the outer surfaces call.
pub struct Orchestrator<E, T, M, X = NoExecutor> {
    extractor: E,
    translator: T,
    model: M,
    executor: Option<X>,
    schema: OnceCell<FilterSchema>,
}

impl<E, T, M> Orchestrator<E, T, M, NoExecutor> {
    pub fn new(extractor: E, translator: T, model: M) -> Self {
        Self {
            extractor,
            translator,
            model,
            executor: None,
            schema: OnceCell::new(),
        }
    }
}

impl<E, T, M, X> Orchestrator<E, T, M, X> {
    /// Attaches an executor, enabling `execute = true` calls and the raw
    /// plan escape hatch.
    pub fn with_executor<X2>(self, executor: X2) -> Orchestrator<E, T, M, X2> {
        Orchestrator {
            extractor: self.extractor,
            translator: self.translator,
            model: self.model,
            executor: Some(executor),
            schema: self.schema,
        }
    }
}

impl<E, T, M, X> Orchestrator<E, T, M, X>
where
    E: SchemaExtractor,
    T: QueryTranslator,
    M: FilterModel,
    X: QueryExecutor,
{
    /// Runs the full pipeline with no deadline.
    pub async fn ask(&self, input: &str, execute: bool) -> Result<QueryOutcome, PipelineError> {
        self.run(input, execute, None).await
    }

    /// Runs the full pipeline under a total time budget. Each I/O stage
    /// gets the remaining budget as its deadline; exceeding it fails the
    /// whole call with `Timeout(stage)` and discards partial slices.
    pub async fn ask_with_deadline(
        &self,
        input: &str,
        execute: bool,
        budget: Duration,
    ) -> Result<QueryOutcome, PipelineError> {
        self.run(input, execute, Some(Instant::now() + budget)).await
    }

    /// Raw-plan escape hatch: executes a caller-supplied backend plan,
    /// skipping schema, model, validation, and translation.
    pub async fn run_raw(&self, plan: &Plan) -> Result<QueryResult, PipelineError> {
        let executor = self.executor.as_ref().ok_or_else(no_executor)?;
        executor.execute(plan).await.map_err(PipelineError::from)
    }

    async fn run(
        &self,
        input: &str,
        execute: bool,
        deadline: Option<Instant>,
    ) -> Result<QueryOutcome, PipelineError> {
        let schema = bounded(deadline, Stage::Schema, self.schema()).await?;
        let descriptor = schema.descriptor();

        let user = user_prompt(&descriptor, input);
        tracing::debug!(chars = user.len(), "prompting filter model");
        let response = bounded(
            deadline,
            Stage::Llm,
            self.model.complete(FILTER_SYSTEM_PROMPT, &user),
        )
        .await?;

        let raw = extract_json(&response)?;
        let validated = schema.validate(&raw)?;
        for warning in &validated.warnings {
            tracing::debug!("validator correction: {warning}");
        }

        let plans = self
            .translator
            .translate(&validated.filters, schema.fields())?;

        let results = if execute {
            Some(
                self.execute_all(&plans, &validated.warnings, deadline)
                    .await?,
            )
        } else {
            None
        };

        Ok(QueryOutcome {
            natural_language_query: input.to_string(),
            extracted_filters: validated.filters,
            database_queries: plans,
            results,
            warnings: validated.warnings,
        })
    }

    /// Builds (or returns the cached) filter schema.
    async fn schema(&self) -> Result<&FilterSchema, PipelineError> {
        self.schema
            .get_or_try_init(|| async {
                let fields = self.extractor.extract().await?;
                FilterSchema::new(fields).map_err(PipelineError::from)
            })
            .await
    }

    /// Executes all plans concurrently, reassembling results in slice
    /// order. A failed slice becomes a failed `QueryResult`; the other
    /// slices still come back.
    async fn execute_all(
        &self,
        plans: &[Plan],
        warnings: &[String],
        deadline: Option<Instant>,
    ) -> Result<Vec<QueryResult>, PipelineError> {
        let executor = self.executor.as_ref().ok_or_else(no_executor)?;

        let run = futures::future::join_all(plans.iter().map(|plan| async move {
            match executor.execute(plan).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(error = %e, "slice execution failed");
                    QueryResult::failure(e.to_string())
                }
            }
        }));
        let mut results = match deadline {
            None => run.await,
            Some(at) => tokio::time::timeout_at(at, run)
                .await
                .map_err(|_| PipelineError::Timeout {
                    stage: Stage::Execute,
                })?,
        };

        if !warnings.is_empty() {
            for result in &mut results {
                result
                    .metadata
                    .insert("warnings".to_string(), json!(warnings));
            }
        }
        Ok(results)
    }
}

fn no_executor() -> PipelineError {
    PipelineError::Backend(BackendError::Internal {
        message: "execution requested but no executor is configured".to_string(),
    })
}

/// Applies the stage deadline to one I/O future.
async fn bounded<F, O>(deadline: Option<Instant>, stage: Stage, fut: F) -> Result<O, PipelineError>
where
    F: Future<Output = Result<O, PipelineError>>,
{
    match deadline {
        None => fut.await,
        Some(at) => tokio::time::timeout_at(at, fut)
            .await
            .map_err(|_| PipelineError::Timeout { stage })?,
    }
}
