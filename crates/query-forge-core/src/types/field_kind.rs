use serde::{Deserialize, Serialize};

/// The normalized type tags shared by every backend.
///
/// Backend-specific metadata (search mapping types, sampled document
/// literals) is folded into this closed set before anything downstream
/// sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Date,
    Boolean,
    Enum,
    Array,
    Object,
}

impl FieldKind {
    /// Returns the lowercase tag used in serialized form and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// True for kinds that support numeric aggregation (sum, avg, min, max).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
