//! The seam to the external language model.
//!
//! The concrete client (provider, auth, transport) lives outside this
//! workspace; the orchestrator only needs `complete` and a way to dig
//! the JSON payload out of whatever prose surrounds it.

use std::future::Future;

use serde_json::Value;

use crate::error::PipelineError;

/// An external model that turns a prompt pair into a filter document.
///
/// Uses RPITIT for the async method, like the backend traits.
pub trait FilterModel: Send + Sync {
    /// Runs one completion. `system` carries the filter grammar and the
    /// field descriptor; `user` carries the natural-language question.
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, PipelineError>> + Send;
}

/// Extracts the JSON payload from a model response.
///
/// Models frequently wrap the document in markdown fences or surround it
/// with prose; this peels fences first, then falls back to the outermost
/// brace span. Anything unparseable is an `Llm` error.
pub fn extract_json(response: &str) -> Result<Value, PipelineError> {
    let candidate = fenced_block(response)
        .or_else(|| brace_span(response))
        .unwrap_or_else(|| response.trim().to_string());
    serde_json::from_str(&candidate).map_err(|e| PipelineError::Llm {
        reason: format!("model output is not valid JSON: {e}"),
    })
}

fn fenced_block(response: &str) -> Option<String> {
    let open = response.find("```")?;
    let after_fence = &response[open + 3..];
    let close = after_fence.find("```")?;
    let block = &after_fence[..close];
    // Strip an optional language tag on the fence line.
    let body = match block.split_once('\n') {
        Some((first_line, rest)) if first_line.trim().eq_ignore_ascii_case("json") => rest,
        Some((first_line, rest)) if first_line.trim().is_empty() => rest,
        _ => block,
    };
    Some(body.trim().to_string())
}

fn brace_span(response: &str) -> Option<String> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(response[start..=end].to_string())
}
