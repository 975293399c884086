//! Error types for pipeline resolution.
//!
//! Structural problems with a pipeline are fatal and abort resolution as a
//! whole; each carries the names of the offending tasks plus an
//! [`ErrorInfo`] with a stable code for tooling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Codes attached to [`ErrorInfo`].
pub mod codes {
    /// Dependency cycle, including a task depending on itself.
    pub const CYCLE: &str = "PIPELINE-001-CYCLE";
    /// Dependency on a task that does not exist.
    pub const MISSING_DEP: &str = "PIPELINE-002-MISSING_DEP";
    /// Two tasks share a name.
    pub const DUPLICATE: &str = "PIPELINE-003-DUPLICATE";
    /// A finally task orders itself against another task.
    pub const FINALLY_REF: &str = "PIPELINE-004-FINALLY_REF";
    /// Generic structural violation.
    pub const INVALID: &str = "PIPELINE-005-INVALID";
    /// Parameter default does not match its declared type.
    pub const PARAM_TYPE: &str = "PIPELINE-006-PARAM_TYPE";
    /// Reference to a parameter the pipeline does not declare.
    pub const UNDECLARED_PARAM: &str = "PIPELINE-007-UNDECLARED_PARAM";
    /// Timeout above the configured ceiling.
    pub const TIMEOUT: &str = "PIPELINE-008-TIMEOUT";
    /// Task name is empty or not a DNS-1123 label.
    pub const NAME: &str = "PIPELINE-009-NAME";
    /// Task has both or neither of a reference and an inline spec.
    pub const TASK_KIND: &str = "PIPELINE-010-TASK_KIND";
    /// Malformed when expression.
    pub const WHEN: &str = "PIPELINE-011-WHEN";
    /// Deprecated conditions used while disabled.
    pub const CONDITIONS: &str = "PIPELINE-012-CONDITIONS";
    /// Pipeline result that does not reference a main task result.
    pub const RESULT: &str = "PIPELINE-013-RESULT";
}

/// The main error type for pipeflow operations.
#[derive(Debug, Error)]
pub enum PipeflowError {
    /// A structural validation error occurred.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A cycle was detected in the task graph.
    #[error("{0}")]
    CycleDetected(#[from] CycleDetectedError),

    /// A task depends on a task that does not exist.
    #[error("{0}")]
    MissingDependency(#[from] MissingDependencyError),

    /// Two tasks share a name.
    #[error("{0}")]
    DuplicateTask(#[from] DuplicateTaskError),

    /// A finally task references another task in a forbidden way.
    #[error("{0}")]
    FinallyReference(#[from] FinallyReferenceError),

    /// A referenced task definition could not be found.
    #[error("{0}")]
    TaskNotFound(#[from] TaskNotFoundError),

    /// A name outside the graph was passed in.
    #[error("{0}")]
    UnknownTask(#[from] UnknownTaskError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl PipeflowError {
    /// Returns the diagnostic info of a structural error, if any.
    #[must_use]
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Validation(e) => e.error_info.as_ref(),
            Self::CycleDetected(e) => Some(&e.error_info),
            Self::MissingDependency(e) => Some(&e.error_info),
            Self::DuplicateTask(e) => Some(&e.error_info),
            Self::FinallyReference(e) => Some(&e.error_info),
            Self::TaskNotFound(_) | Self::UnknownTask(_) | Self::Config(_) => None,
        }
    }

    /// Returns the error code of a structural error, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info().map(|info| info.code.as_str())
    }
}

/// Diagnostic metadata attached to structural errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErrorInfo {
    /// Error code (e.g., "PIPELINE-001-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error info, pre-filled with the code's default hint.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        let code = code.into();
        let fix_hint = ErrorSuggestions::get(&code).map(str::to_string);
        Self {
            code,
            summary: summary.into(),
            fix_hint,
            context: BTreeMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline specification is structurally invalid.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The tasks involved in the error.
    pub tasks: Vec<String>,
    /// Optional diagnostic info.
    pub error_info: Option<ErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tasks: Vec::new(),
            error_info: None,
        }
    }

    /// Creates a validation error with a code, using the message as summary.
    #[must_use]
    pub fn with_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let info = ErrorInfo::new(code, message.clone());
        Self::new(message).with_error_info(info)
    }

    /// Sets the tasks involved.
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<String>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Adds a single task involved.
    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.tasks.push(task.into());
        self
    }

    /// Sets the diagnostic info.
    #[must_use]
    pub fn with_error_info(mut self, info: ErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|i| i.code.as_str())
    }
}

/// Error raised when a cycle is detected in the task graph.
///
/// The path starts and ends with the same task, e.g. `a -> b -> c -> a`.
/// A task depending on itself is reported as `a -> a`.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected in pipeline: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The tasks forming the cycle, first task repeated at the end.
    pub cycle_path: Vec<String>,
    /// Diagnostic info.
    pub error_info: ErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        let info = ErrorInfo::new(
            codes::CYCLE,
            format!("Pipeline contains a dependency cycle: {}", cycle_path.join(" -> ")),
        );

        Self {
            cycle_path,
            error_info: info,
        }
    }

    /// Returns the distinct tasks on the cycle, in path order.
    #[must_use]
    pub fn tasks(&self) -> &[String] {
        match self.cycle_path.split_last() {
            Some((_, rest)) if !rest.is_empty() => rest,
            _ => &self.cycle_path,
        }
    }
}

/// Error raised when a task depends on a task that does not exist.
#[derive(Debug, Clone, Error)]
#[error("Task '{task}' depends on '{missing}' but '{missing}' is not a task in this pipeline")]
pub struct MissingDependencyError {
    /// The task declaring the dependency.
    pub task: String,
    /// The unresolved dependency name.
    pub missing: String,
    /// Diagnostic info.
    pub error_info: ErrorInfo,
}

impl MissingDependencyError {
    /// Creates a new missing dependency error.
    #[must_use]
    pub fn new(task: impl Into<String>, missing: impl Into<String>) -> Self {
        let task = task.into();
        let missing = missing.into();
        let info = ErrorInfo::new(codes::MISSING_DEP, format!("Dependency '{missing}' not found"))
            .with_context_entry("task", task.clone());
        Self {
            task,
            missing,
            error_info: info,
        }
    }
}

/// Error raised when two tasks share a name.
#[derive(Debug, Clone, Error)]
#[error("Duplicate pipeline task name '{name}'")]
pub struct DuplicateTaskError {
    /// The duplicated name.
    pub name: String,
    /// Diagnostic info.
    pub error_info: ErrorInfo,
}

impl DuplicateTaskError {
    /// Creates a new duplicate task error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let info = ErrorInfo::new(codes::DUPLICATE, format!("Task name '{name}' is used more than once"));
        Self {
            name,
            error_info: info,
        }
    }
}

/// How a finally task referenced another task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinallyReferenceKind {
    /// Through `runAfter`.
    RunAfter,
    /// Through a resource input's `from`.
    ResourceFrom,
    /// Through a result reference to another finally task.
    FinallyResult,
}

impl fmt::Display for FinallyReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunAfter => write!(f, "runAfter"),
            Self::ResourceFrom => write!(f, "resource from"),
            Self::FinallyResult => write!(f, "result of another finally task"),
        }
    }
}

/// Error raised when a finally task orders itself against another task.
///
/// Finally tasks run in parallel once the main graph is done, so they may
/// only consume main-task results.
#[derive(Debug, Clone, Error)]
#[error("Finally task '{task}' references '{reference}' through {kind}")]
pub struct FinallyReferenceError {
    /// The finally task.
    pub task: String,
    /// The referenced task.
    pub reference: String,
    /// How it was referenced.
    pub kind: FinallyReferenceKind,
    /// Diagnostic info.
    pub error_info: ErrorInfo,
}

impl FinallyReferenceError {
    /// Creates a new finally reference error.
    #[must_use]
    pub fn new(
        task: impl Into<String>,
        reference: impl Into<String>,
        kind: FinallyReferenceKind,
    ) -> Self {
        let task = task.into();
        let reference = reference.into();
        let info = ErrorInfo::new(
            codes::FINALLY_REF,
            format!("Finally task '{task}' cannot depend on '{reference}'"),
        )
        .with_context_entry("kind", kind.to_string());
        Self {
            task,
            reference,
            kind,
            error_info: info,
        }
    }
}

/// Error raised when a task reference cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Task definition '{name}' not found")]
pub struct TaskNotFoundError {
    /// The referenced task name.
    pub name: String,
}

impl TaskNotFoundError {
    /// Creates a new task not found error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Error raised when a caller names a task that is not in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Task '{name}' is not part of the pipeline graph")]
pub struct UnknownTaskError {
    /// The unknown name.
    pub name: String,
}

impl UnknownTaskError {
    /// Creates a new unknown task error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// The file extension is not recognised.
    #[error("unsupported config format '{0}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}

/// Provides default suggestions for error codes.
pub struct ErrorSuggestions;

impl ErrorSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            codes::CYCLE => Some(
                "Remove one of the runAfter entries, resource 'from' bindings or result \
                 references on the cycle.",
            ),
            codes::MISSING_DEP => Some(
                "Ensure every runAfter entry, 'from' binding and result reference names a task \
                 in spec.tasks. Check for typos in task names.",
            ),
            codes::DUPLICATE => Some("Rename one of the tasks; names are shared by tasks and finally."),
            codes::FINALLY_REF => Some(
                "Finally tasks run in parallel after the main graph. Drop runAfter and 'from' \
                 and only reference results of main tasks.",
            ),
            codes::PARAM_TYPE => Some("Make the default a string for type 'string' or a list for type 'array'."),
            codes::UNDECLARED_PARAM => Some("Declare the parameter in spec.params."),
            codes::TIMEOUT => Some("Lower the task timeout or raise max_task_timeout_seconds."),
            codes::NAME => Some(
                "Use lowercase alphanumerics and '-', starting and ending with an alphanumeric, \
                 at most 63 characters.",
            ),
            codes::TASK_KIND => Some("Set exactly one of taskRef or taskSpec."),
            codes::WHEN => Some("Give every when expression at least one value."),
            codes::CONDITIONS => Some("Replace conditions with when expressions."),
            codes::RESULT => Some("Pipeline results must reference results of tasks in spec.tasks."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_info_picks_up_default_hint() {
        let info = ErrorInfo::new(codes::CYCLE, "cycle");
        assert!(info.fix_hint.is_some());

        let info = ErrorInfo::new("UNKNOWN", "other").with_context_entry("task", "a");
        assert_eq!(info.fix_hint, None);
        assert_eq!(info.context.get("task"), Some(&"a".to_string()));
    }

    #[test]
    fn test_cycle_detected_error() {
        let err = CycleDetectedError::new(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ]);

        assert!(err.to_string().contains("a -> b -> c -> a"));
        assert_eq!(err.error_info.code, codes::CYCLE);
        assert_eq!(err.tasks(), &["a", "b", "c"]);
    }

    #[test]
    fn test_self_cycle_tasks() {
        let err = CycleDetectedError::new(vec!["a".to_string(), "a".to_string()]);
        assert_eq!(err.tasks(), &["a"]);
        assert_eq!(err.to_string(), "Cycle detected in pipeline: a -> a");
    }

    #[test]
    fn test_missing_dependency_names_both_sides() {
        let err = MissingDependencyError::new("deploy", "ghost");
        let msg = err.to_string();
        assert!(msg.contains("deploy"));
        assert!(msg.contains("ghost"));
        assert_eq!(err.error_info.code, codes::MISSING_DEP);
    }

    #[test]
    fn test_top_level_error_exposes_code() {
        let err: PipeflowError = DuplicateTaskError::new("a").into();
        assert_eq!(err.code(), Some(codes::DUPLICATE));

        let err: PipeflowError = TaskNotFoundError::new("t").into();
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_validation_error_with_code() {
        let err = PipelineValidationError::with_code(codes::NAME, "bad name").with_task("Bad_Name");
        assert_eq!(err.code(), Some(codes::NAME));
        assert_eq!(err.tasks, vec!["Bad_Name".to_string()]);
    }

    #[test]
    fn test_every_code_has_a_suggestion() {
        for code in [
            codes::CYCLE,
            codes::MISSING_DEP,
            codes::DUPLICATE,
            codes::FINALLY_REF,
            codes::PARAM_TYPE,
            codes::UNDECLARED_PARAM,
            codes::TIMEOUT,
            codes::NAME,
            codes::TASK_KIND,
            codes::WHEN,
            codes::CONDITIONS,
            codes::RESULT,
        ] {
            assert!(ErrorSuggestions::get(code).is_some(), "{code}");
        }
        assert!(ErrorSuggestions::get("UNKNOWN").is_none());
    }
}
