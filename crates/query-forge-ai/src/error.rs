use std::fmt;

use query_forge_backend::error::{BackendError, TranslationError};
use query_forge_core::error::{SchemaError, ValidationError};

/// The pipeline stage a deadline expired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Field map extraction from the backend.
    Schema,
    /// The external model call.
    Llm,
    /// Plan execution.
    Execute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Llm => "llm",
            Self::Execute => "execute",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by the orchestrator.
///
/// Validation errors are returned verbatim so the caller can fix the
/// prompt; translation errors indicate a validator gap and are fatal;
/// backend errors at execution time are per-slice and do NOT appear
/// here (they surface as failed `QueryResult`s instead).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PipelineError {
    /// The extractor could not produce a usable field map.
    Schema(SchemaError),
    /// The model's IR document was rejected.
    Validation(ValidationError),
    /// A validated IR could not be lowered.
    Translation(TranslationError),
    /// A backend call failed outside per-slice execution (e.g. the raw
    /// plan escape hatch).
    Backend(BackendError),
    /// The external model produced non-JSON or structurally unusable
    /// output.
    Llm { reason: String },
    /// A stage deadline expired; the whole call is cancelled.
    Timeout { stage: Stage },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "schema extraction failed: {e}"),
            Self::Validation(e) => write!(f, "filter validation failed: {e}"),
            Self::Translation(e) => write!(f, "plan translation failed: {e}"),
            Self::Backend(e) => write!(f, "backend call failed: {e}"),
            Self::Llm { reason } => write!(f, "language model error: {reason}"),
            Self::Timeout { stage } => write!(f, "deadline exceeded during {stage}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Validation(e) => Some(e),
            Self::Translation(e) => Some(e),
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaError> for PipelineError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl From<ValidationError> for PipelineError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<TranslationError> for PipelineError {
    fn from(e: TranslationError) -> Self {
        Self::Translation(e)
    }
}

impl From<BackendError> for PipelineError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_spellings() {
        assert_eq!(Stage::Schema.to_string(), "schema");
        assert_eq!(Stage::Llm.to_string(), "llm");
        assert_eq!(Stage::Execute.to_string(), "execute");
    }

    #[test]
    fn displays_carry_context() {
        let err = PipelineError::from(SchemaError::EmptyFieldMap);
        assert!(err.to_string().contains("schema extraction failed"));

        let err = PipelineError::Llm {
            reason: "response was not JSON".into(),
        };
        assert!(err.to_string().contains("not JSON"));

        let err = PipelineError::Timeout { stage: Stage::Llm };
        assert_eq!(err.to_string(), "deadline exceeded during llm");
    }

    #[test]
    fn wrapped_errors_expose_source() {
        use std::error::Error;
        let err = PipelineError::from(SchemaError::EmptyFieldMap);
        assert!(err.source().is_some());
        let err = PipelineError::Timeout { stage: Stage::Execute };
        assert!(err.source().is_none());
    }
}
