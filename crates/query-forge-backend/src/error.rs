use std::fmt;

/// Errors that occur while talking to a backing store.
///
/// All variants carry enough context to produce actionable error messages.
/// Uses `String` for external error details to maintain `Clone` + `Eq`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    /// Connection or transport-level error.
    Connection { message: String },
    /// The backend refused or failed an executing plan.
    Query { message: String },
    /// The backend answered with something the executor could not read.
    MalformedResponse { message: String },
    /// A plan was handed to an executor for a different backend family.
    WrongTarget { expected: String, actual: String },
    /// Internal or unexpected error.
    Internal { message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection { message } => {
                write!(f, "backend connection error: {message}")
            }
            Self::Query { message } => {
                write!(f, "query execution error: {message}")
            }
            Self::MalformedResponse { message } => {
                write!(f, "malformed backend response: {message}")
            }
            Self::WrongTarget { expected, actual } => {
                write!(f, "plan targets '{actual}' but this executor runs '{expected}' plans")
            }
            Self::Internal { message } => {
                write!(f, "internal backend error: {message}")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Errors raised while lowering a validated IR to a backend plan.
///
/// These indicate a gap in validation rather than bad user input and are
/// treated as fatal by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TranslationError {
    /// A slice references a field the field map does not know.
    UnknownField { field: String },
    /// The IR combination has no lowering on this backend.
    Unsupported { reason: String },
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { field } => {
                write!(f, "cannot translate unknown field '{field}'")
            }
            Self::Unsupported { reason } => {
                write!(f, "unsupported query shape: {reason}")
            }
        }
    }
}

impl std::error::Error for TranslationError {}
