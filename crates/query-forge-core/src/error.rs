use std::fmt;

/// Errors that occur while deriving or assembling a field map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// The field map is empty; no validator can be built from it.
    EmptyFieldMap,
    /// The backend could not be reached or refused the metadata call.
    Unreachable { message: String },
    /// The mapping document root is not usable (not an object, no entries).
    MalformedMapping { reason: String },
    /// A field path was empty.
    EmptyFieldPath,
    /// A field path contained an empty segment.
    InvalidFieldPath { path: String, reason: String },
    /// Two entries share the same dotted path.
    DuplicateFieldPath(String),
    /// Enum values list was empty.
    EmptyEnumValues,
    /// Enum value string was empty.
    EmptyEnumValue,
    /// Duplicate enum value found.
    DuplicateEnumValue(String),
    /// A field spec's optional parts disagree with its kind.
    SpecMismatch { path: String, reason: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFieldMap => {
                write!(f, "field map is empty: cannot build a filter schema")
            }
            Self::Unreachable { message } => {
                write!(f, "backend unreachable: {message}")
            }
            Self::MalformedMapping { reason } => {
                write!(f, "malformed mapping document: {reason}")
            }
            Self::EmptyFieldPath => write!(f, "field path must not be empty"),
            Self::InvalidFieldPath { path, reason } => {
                write!(f, "invalid field path '{path}': {reason}")
            }
            Self::DuplicateFieldPath(p) => write!(f, "duplicate field path '{p}'"),
            Self::EmptyEnumValues => write!(f, "enum values must not be empty"),
            Self::EmptyEnumValue => write!(f, "enum value must not be an empty string"),
            Self::DuplicateEnumValue(v) => write!(f, "duplicate enum value '{v}'"),
            Self::SpecMismatch { path, reason } => {
                write!(f, "inconsistent field spec for '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// The closed set of reasons an IR document can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationErrorKind {
    /// A condition, sort key, grouping, or aggregation names a field that
    /// is not in the field map.
    UnknownField,
    /// The operator (or aggregation kind) is not legal for the field's type.
    IllegalOperator,
    /// The value's JSON shape does not fit the operator and field type.
    BadValueShape,
    /// An enum field was compared against a literal outside its value set.
    BadEnumValue,
    /// having_operator/having_value are inconsistent or malformed.
    BadHaving,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField => write!(f, "unknown field"),
            Self::IllegalOperator => write!(f, "illegal operator"),
            Self::BadValueShape => write!(f, "bad value shape"),
            Self::BadEnumValue => write!(f, "bad enum value"),
            Self::BadHaving => write!(f, "bad having clause"),
        }
    }
}

/// An IR rejection: what went wrong, where (JSON pointer), and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// JSON pointer to the offending element, e.g. `/filters/0/conditions/2`.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unknown_field(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::UnknownField, path, message)
    }

    pub fn illegal_operator(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::IllegalOperator, path, message)
    }

    pub fn bad_value_shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::BadValueShape, path, message)
    }

    pub fn bad_enum_value(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::BadEnumValue, path, message)
    }

    pub fn bad_having(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::BadHaving, path, message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_display_messages() {
        let cases = vec![
            (SchemaError::EmptyFieldMap, "field map is empty"),
            (
                SchemaError::Unreachable {
                    message: "connection refused".into(),
                },
                "backend unreachable: connection refused",
            ),
            (
                SchemaError::MalformedMapping {
                    reason: "root is not an object".into(),
                },
                "malformed mapping document",
            ),
            (SchemaError::EmptyFieldPath, "field path must not be empty"),
            (
                SchemaError::InvalidFieldPath {
                    path: "a..b".into(),
                    reason: "path contains empty segment".into(),
                },
                "invalid field path 'a..b'",
            ),
            (
                SchemaError::DuplicateFieldPath("t.amt".into()),
                "duplicate field path 't.amt'",
            ),
            (SchemaError::EmptyEnumValues, "enum values must not be empty"),
            (
                SchemaError::EmptyEnumValue,
                "enum value must not be an empty string",
            ),
            (
                SchemaError::DuplicateEnumValue("GOLD".into()),
                "duplicate enum value 'GOLD'",
            ),
            (
                SchemaError::SpecMismatch {
                    path: "t.tags".into(),
                    reason: "array kind requires an item kind".into(),
                },
                "inconsistent field spec for 't.tags'",
            ),
        ];

        for (error, expected_prefix) in cases {
            let msg = error.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error display for {error:?} = '{msg}', expected to start with '{expected_prefix}'"
            );
        }
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::illegal_operator(
            "/filters/0/conditions/1",
            "'contains' is not legal for number fields",
        );
        assert_eq!(
            err.to_string(),
            "illegal operator at /filters/0/conditions/1: 'contains' is not legal for number fields"
        );
    }

    #[test]
    fn validation_error_kinds_display() {
        assert_eq!(ValidationErrorKind::UnknownField.to_string(), "unknown field");
        assert_eq!(
            ValidationErrorKind::IllegalOperator.to_string(),
            "illegal operator"
        );
        assert_eq!(
            ValidationErrorKind::BadValueShape.to_string(),
            "bad value shape"
        );
        assert_eq!(
            ValidationErrorKind::BadEnumValue.to_string(),
            "bad enum value"
        );
        assert_eq!(ValidationErrorKind::BadHaving.to_string(), "bad having clause");
    }

    #[test]
    fn errors_are_std_errors() {
        let err: Box<dyn std::error::Error> = Box::new(SchemaError::EmptyFieldMap);
        assert!(err.to_string().contains("field map"));
        let err: Box<dyn std::error::Error> =
            Box::new(ValidationError::unknown_field("/filters/0", "no such field"));
        assert!(err.to_string().contains("unknown field"));
    }
}
