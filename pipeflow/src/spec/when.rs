//! Guard predicates attached to pipeline tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Set-membership operator of a when expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhenOperator {
    /// `input` must be one of `values`.
    In,
    /// `input` must not be any of `values`.
    NotIn,
}

impl fmt::Display for WhenOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::NotIn => write!(f, "notin"),
        }
    }
}

/// A guard evaluated before the task runs.
///
/// Only `input` and `values` may embed references to other tasks' results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhenExpression {
    /// Value under test; may contain `$(...)` references.
    pub input: String,
    /// Comparison operator.
    pub operator: WhenOperator,
    /// Candidate set; entries may contain `$(...)` references.
    pub values: Vec<String>,
}

impl WhenExpression {
    /// Creates a new when expression.
    #[must_use]
    pub fn new<I, S>(input: impl Into<String>, operator: WhenOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns every string that may carry embedded references.
    pub fn scannable_strings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.input.as_str()).chain(self.values.iter().map(String::as_str))
    }
}
