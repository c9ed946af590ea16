use std::path::PathBuf;

use query_forge_backend::error::{BackendError, TranslationError};
use query_forge_core::error::{SchemaError, ValidationError};

/// Exit codes for the CLI process.
///
/// - 0: success
/// - 1: general error
/// - 2: invalid arguments / usage error
/// - 3: validation failure (the filter document was rejected)
/// - 10+: backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArguments = 2,
    ValidationFailed = 3,
    ConnectionError = 10,
}

/// Errors returned by CLI command handlers.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// IO errors (file not found, permission denied).
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A supplied document was not parseable JSON.
    #[error("{path} is not valid JSON: {message}")]
    BadJson { path: PathBuf, message: String },

    /// Schema extraction or mapping errors.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The filter document was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A validated IR could not be lowered.
    #[error("translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Backend connection/query errors.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl CliError {
    /// Maps each error to its process exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config { .. } => ExitCode::InvalidArguments,
            Self::Validation(_) | Self::BadJson { .. } => ExitCode::ValidationFailed,
            Self::Backend(_) => ExitCode::ConnectionError,
            Self::Schema(SchemaError::Unreachable { .. }) => ExitCode::ConnectionError,
            _ => ExitCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_by_error_family() {
        let err = CliError::Config {
            message: "bad".into(),
        };
        assert_eq!(err.exit_code(), ExitCode::InvalidArguments);

        let err = CliError::from(ValidationError::unknown_field("/filters/0", "nope"));
        assert_eq!(err.exit_code(), ExitCode::ValidationFailed);

        let err = CliError::from(BackendError::Connection {
            message: "refused".into(),
        });
        assert_eq!(err.exit_code(), ExitCode::ConnectionError);

        let err = CliError::from(SchemaError::Unreachable {
            message: "down".into(),
        });
        assert_eq!(err.exit_code(), ExitCode::ConnectionError);

        let err = CliError::from(SchemaError::EmptyFieldMap);
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
    }

    #[test]
    fn validation_error_displays_transparently() {
        let err = CliError::from(ValidationError::illegal_operator(
            "/filters/0/conditions/0",
            "'contains' is not legal for number fields",
        ));
        assert!(err.to_string().starts_with("illegal operator at"));
    }
}
