use std::fmt;

use serde::{Deserialize, Serialize};

/// Calendar intervals for date-histogram grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Day,
    Week,
    Month,
    Year,
}

impl Interval {
    pub const ALL: [Interval; 4] = [Interval::Day, Interval::Week, Interval::Month, Interval::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == s)
    }

    /// The search backend's calendar interval name.
    pub fn calendar_interval(&self) -> &'static str {
        self.as_str()
    }

    /// The search backend's date format string for bucket keys.
    /// Week buckets use the ISO week spelling.
    pub fn search_format(&self) -> &'static str {
        match self {
            Self::Day => "yyyy-MM-dd",
            Self::Week => "yyyy-'W'ww",
            Self::Month => "yyyy-MM",
            Self::Year => "yyyy",
        }
    }

    /// The document store's date-to-string format producing the same
    /// bucket keys (`%G`/`%V` are the ISO week-year and week number).
    pub fn doc_format(&self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Week => "%G-W%V",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
