//! Task result references: `tasks.<task>.results.<result>[selector]`.

use super::expressions::scan_all;
use crate::core::Param;
use crate::spec::{PipelineTaskCondition, WhenExpression};
use serde::{Deserialize, Serialize};
use std::fmt;

const TASKS_PART: &str = "tasks";
const RESULTS_PART: &str = "results";

/// Element selector on an array-typed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSelector {
    /// A single element, `[N]`.
    Index(usize),
    /// Every element, `[*]`.
    All,
}

/// A reference from one task to another task's result.
///
/// Always derived from an expression; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultRef {
    /// Name of the producing pipeline task.
    pub pipeline_task: String,
    /// Name of the result.
    pub result: String,
    /// Optional element selector.
    pub selector: Option<ResultSelector>,
}

impl ResultRef {
    /// Creates a reference without a selector.
    #[must_use]
    pub fn new(pipeline_task: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            pipeline_task: pipeline_task.into(),
            result: result.into(),
            selector: None,
        }
    }

    /// Parses the body of a scanned expression.
    ///
    /// Returns `None` for anything that is not a result reference, such as
    /// `params.foo` or `context.pipelineRun.name`.
    #[must_use]
    pub fn parse(expression: &str) -> Option<Self> {
        let (path, selector) = split_selector(expression)?;

        let mut parts = path.split('.');
        let (Some(tasks), Some(task), Some(results), Some(result), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return None;
        };

        if tasks != TASKS_PART || results != RESULTS_PART || task.is_empty() || result.is_empty()
        {
            return None;
        }

        Some(Self {
            pipeline_task: task.to_string(),
            result: result.to_string(),
            selector,
        })
    }

    /// Renders the reference as a `$(...)` expression.
    #[must_use]
    pub fn to_expression(&self) -> String {
        format!("$({self})")
    }
}

impl fmt::Display for ResultRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{TASKS_PART}.{}.{RESULTS_PART}.{}",
            self.pipeline_task, self.result
        )?;
        match self.selector {
            Some(ResultSelector::Index(i)) => write!(f, "[{i}]"),
            Some(ResultSelector::All) => write!(f, "[*]"),
            None => Ok(()),
        }
    }
}

fn split_selector(expression: &str) -> Option<(&str, Option<ResultSelector>)> {
    let Some(open) = expression.find('[') else {
        return Some((expression, None));
    };
    let inner = expression[open..].strip_prefix('[')?.strip_suffix(']')?;
    let selector = if inner == "*" {
        ResultSelector::All
    } else {
        ResultSelector::Index(inner.parse().ok()?)
    };
    Some((&expression[..open], Some(selector)))
}

/// Parses every expression that is a result reference, dropping the rest.
#[must_use]
pub fn result_refs<I, S>(expressions: I) -> Vec<ResultRef>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    expressions
        .into_iter()
        .filter_map(|e| ResultRef::parse(e.as_ref()))
        .collect()
}

/// Result references embedded in a parameter binding.
#[must_use]
pub fn result_refs_in_param(param: &Param) -> Vec<ResultRef> {
    result_refs(scan_all(param.value.scannable_strings()))
}

/// Result references embedded in a when expression's input and values.
#[must_use]
pub fn result_refs_in_when(expression: &WhenExpression) -> Vec<ResultRef> {
    result_refs(scan_all(expression.scannable_strings()))
}

/// Result references embedded in a deprecated condition's parameters.
#[must_use]
pub fn result_refs_in_condition(condition: &PipelineTaskCondition) -> Vec<ResultRef> {
    condition
        .params
        .iter()
        .flat_map(result_refs_in_param)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ParamValue;
    use crate::spec::WhenOperator;

    #[test]
    fn test_parse_plain_reference() {
        let r = ResultRef::parse("tasks.build.results.image").unwrap();
        assert_eq!(r.pipeline_task, "build");
        assert_eq!(r.result, "image");
        assert_eq!(r.selector, None);
    }

    #[test]
    fn test_parse_with_selectors() {
        let r = ResultRef::parse("tasks.build.results.tags[*]").unwrap();
        assert_eq!(r.selector, Some(ResultSelector::All));

        let r = ResultRef::parse("tasks.build.results.tags[3]").unwrap();
        assert_eq!(r.selector, Some(ResultSelector::Index(3)));
        assert_eq!(r.to_expression(), "$(tasks.build.results.tags[3])");
    }

    #[test]
    fn test_non_result_expressions_are_ignored() {
        assert!(ResultRef::parse("params.revision").is_none());
        assert!(ResultRef::parse("context.pipelineRun.name").is_none());
        assert!(ResultRef::parse("tasks.build.results").is_none());
        assert!(ResultRef::parse("tasks.build.outputs.image").is_none());
        assert!(ResultRef::parse("tasks.build.results.image.extra").is_none());
        assert!(ResultRef::parse("tasks..results.image").is_none());
        assert!(ResultRef::parse("tasks.build.results.tags[x]").is_none());
    }

    #[test]
    fn test_refs_in_array_param() {
        let param = Param::new(
            "args",
            ParamValue::array(["$(tasks.a.results.x)", "plain", "$(params.p) $(tasks.b.results.y)"]),
        );
        let tasks: Vec<String> = result_refs_in_param(&param)
            .into_iter()
            .map(|r| r.pipeline_task)
            .collect();
        assert_eq!(tasks, vec!["a", "b"]);
    }

    #[test]
    fn test_refs_in_when_values() {
        let when = WhenExpression::new(
            "$(tasks.check.results.status)",
            WhenOperator::In,
            ["$(tasks.policy.results.allowed)"],
        );
        let tasks: Vec<String> = result_refs_in_when(&when)
            .into_iter()
            .map(|r| r.pipeline_task)
            .collect();
        assert_eq!(tasks, vec!["check", "policy"]);
    }
}
