//! Structural validation of pipeline specifications.
//!
//! Runs before graph construction and stops at the first violation. Graph
//! level problems (unknown dependencies, cycles, finally ordering) are left
//! to [`crate::dag`].

use crate::config::ResolverConfig;
use crate::core::{format_duration, ParamType};
use crate::errors::{codes, DuplicateTaskError, PipeflowError, PipelineValidationError};
use crate::spec::{PipelineSpec, PipelineTask};
use crate::substitution::{param_refs_in, param_refs_in_param, result_refs, scan};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Longest allowed task name.
pub const MAX_TASK_NAME_LEN: usize = 63;

static DNS_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")
        .unwrap_or_else(|e| panic!("invalid label pattern: {e}"))
});

/// Returns true if `name` is a valid task name.
#[must_use]
pub fn is_valid_task_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_TASK_NAME_LEN && DNS_LABEL_RE.is_match(name)
}

/// Validates a pipeline specification.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_spec(spec: &PipelineSpec, config: &ResolverConfig) -> Result<(), PipeflowError> {
    validate_names(spec)?;
    validate_unique_names(spec)?;
    for task in spec.all_tasks() {
        validate_task_kind(task)?;
    }
    validate_declared_params(spec)?;
    for task in spec.all_tasks() {
        validate_when_expressions(task)?;
        validate_conditions(task, config)?;
        validate_timeout(task, config)?;
    }
    if config.validate_param_references {
        validate_param_references(spec)?;
    }
    validate_results(spec)?;
    Ok(())
}

fn validate_names(spec: &PipelineSpec) -> Result<(), PipelineValidationError> {
    for task in spec.all_tasks() {
        if !is_valid_task_name(&task.name) {
            return Err(PipelineValidationError::with_code(
                codes::NAME,
                format!("Invalid pipeline task name '{}'", task.name),
            )
            .with_task(task.name.clone()));
        }
    }
    Ok(())
}

fn validate_unique_names(spec: &PipelineSpec) -> Result<(), DuplicateTaskError> {
    let mut seen = BTreeSet::new();
    for task in spec.all_tasks() {
        if !seen.insert(task.name.as_str()) {
            return Err(DuplicateTaskError::new(task.name.clone()));
        }
    }
    Ok(())
}

fn validate_task_kind(task: &PipelineTask) -> Result<(), PipelineValidationError> {
    match (&task.task_ref, &task.task_spec) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        (Some(_), Some(_)) => Err(PipelineValidationError::with_code(
            codes::TASK_KIND,
            format!("Pipeline task '{}' sets both taskRef and taskSpec", task.name),
        )
        .with_task(task.name.clone())),
        (None, None) => Err(PipelineValidationError::with_code(
            codes::TASK_KIND,
            format!("Pipeline task '{}' sets neither taskRef nor taskSpec", task.name),
        )
        .with_task(task.name.clone())),
    }
}

fn validate_declared_params(spec: &PipelineSpec) -> Result<(), PipelineValidationError> {
    let mut seen = BTreeSet::new();
    for param in &spec.params {
        if !seen.insert(param.name.as_str()) {
            return Err(PipelineValidationError::with_code(
                codes::INVALID,
                format!("Parameter '{}' is declared more than once", param.name),
            ));
        }
        if !param.default_matches_type() {
            let declared = param.kind.map(|k| k.to_string()).unwrap_or_default();
            return Err(PipelineValidationError::with_code(
                codes::PARAM_TYPE,
                format!(
                    "Parameter '{}' is declared as {declared} but its default is not",
                    param.name
                ),
            ));
        }
    }
    Ok(())
}

fn validate_when_expressions(task: &PipelineTask) -> Result<(), PipelineValidationError> {
    for expression in &task.when_expressions {
        if expression.values.is_empty() {
            return Err(PipelineValidationError::with_code(
                codes::WHEN,
                format!(
                    "When expression '{}' on task '{}' has no values",
                    expression.input, task.name
                ),
            )
            .with_task(task.name.clone()));
        }
    }
    Ok(())
}

fn validate_conditions(
    task: &PipelineTask,
    config: &ResolverConfig,
) -> Result<(), PipelineValidationError> {
    if task.conditions.is_empty() {
        return Ok(());
    }
    if !config.allow_deprecated_conditions {
        return Err(PipelineValidationError::with_code(
            codes::CONDITIONS,
            format!("Pipeline task '{}' uses deprecated conditions", task.name),
        )
        .with_task(task.name.clone()));
    }
    tracing::warn!(
        task = %task.name,
        conditions = task.conditions.len(),
        "Pipeline task uses deprecated conditions; prefer when expressions"
    );
    Ok(())
}

fn validate_timeout(task: &PipelineTask, config: &ResolverConfig) -> Result<(), PipelineValidationError> {
    let Some(timeout) = task.timeout else {
        return Ok(());
    };
    let max = config.max_task_timeout();
    if timeout > max {
        return Err(PipelineValidationError::with_code(
            codes::TIMEOUT,
            format!(
                "Timeout {} of task '{}' exceeds the maximum of {}",
                format_duration(timeout),
                task.name,
                format_duration(max)
            ),
        )
        .with_task(task.name.clone()));
    }
    Ok(())
}

fn validate_param_references(spec: &PipelineSpec) -> Result<(), PipelineValidationError> {
    for task in spec.all_tasks() {
        let refs = task
            .params
            .iter()
            .flat_map(param_refs_in_param)
            .chain(task.conditions.iter().flat_map(|c| c.params.iter().flat_map(param_refs_in_param)))
            .chain(task.when_expressions.iter().flat_map(|w| param_refs_in(w.scannable_strings())));

        for reference in refs {
            let Some(declared) = spec.params.iter().find(|p| p.name == reference.name) else {
                return Err(PipelineValidationError::with_code(
                    codes::UNDECLARED_PARAM,
                    format!(
                        "Pipeline task '{}' references undeclared parameter '{}'",
                        task.name, reference.name
                    ),
                )
                .with_task(task.name.clone()));
            };
            if reference.whole_array && declared.resolved_type() == Some(ParamType::String) {
                return Err(PipelineValidationError::with_code(
                    codes::PARAM_TYPE,
                    format!(
                        "Pipeline task '{}' uses string parameter '{}' as an array",
                        task.name, reference.name
                    ),
                )
                .with_task(task.name.clone()));
            }
        }
    }
    Ok(())
}

fn validate_results(spec: &PipelineSpec) -> Result<(), PipelineValidationError> {
    let main: BTreeSet<&str> = spec.tasks.iter().map(|t| t.name.as_str()).collect();
    for result in &spec.results {
        let refs = result_refs(scan(&result.value));
        if refs.is_empty() {
            return Err(PipelineValidationError::with_code(
                codes::RESULT,
                format!(
                    "Pipeline result '{}' does not reference a task result",
                    result.name
                ),
            ));
        }
        if let Some(bad) = refs.iter().find(|r| !main.contains(r.pipeline_task.as_str())) {
            return Err(PipelineValidationError::with_code(
                codes::RESULT,
                format!(
                    "Pipeline result '{}' references '{}' which is not a main task",
                    result.name, bad.pipeline_task
                ),
            )
            .with_task(bad.pipeline_task.clone()));
        }
    }
    Ok(())
}
