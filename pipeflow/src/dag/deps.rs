//! Dependency extraction for pipeline tasks.

use super::DagTask;
use crate::spec::PipelineTask;
use crate::substitution::{result_refs_in_condition, result_refs_in_param, result_refs_in_when};
use std::collections::BTreeSet;

impl DagTask for PipelineTask {
    fn hash_key(&self) -> &str {
        &self.name
    }

    fn deps(&self) -> BTreeSet<String> {
        let from = from_deps(self);
        let mut deps = resource_deps(self);
        deps.extend(ordering_deps(self, &from).into_iter().map(str::to_string));
        deps
    }
}

/// Producers named by `from` on resource inputs and condition resources.
#[must_use]
pub fn from_deps(task: &PipelineTask) -> BTreeSet<String> {
    let inputs = task.input_resources().iter();
    let condition_inputs = task.conditions.iter().flat_map(|c| c.resources.iter());

    inputs
        .chain(condition_inputs)
        .flat_map(|r| r.from.iter().cloned())
        .collect()
}

/// Producers named by result references in params, conditions and when
/// expressions.
#[must_use]
pub fn result_ref_deps(task: &PipelineTask) -> BTreeSet<String> {
    let params = task.params.iter().flat_map(result_refs_in_param);
    let conditions = task.conditions.iter().flat_map(result_refs_in_condition);
    let whens = task.when_expressions.iter().flat_map(result_refs_in_when);

    params
        .chain(conditions)
        .chain(whens)
        .map(|r| r.pipeline_task)
        .collect()
}

/// Every data dependency of a task: resource bindings plus result references.
#[must_use]
pub fn resource_deps(task: &PipelineTask) -> BTreeSet<String> {
    let mut deps = from_deps(task);
    deps.extend(result_ref_deps(task));
    deps
}

/// `runAfter` entries not already covered by `from`.
///
/// Only `from` bindings are subtracted. A `runAfter` entry that repeats a
/// result reference is kept here and collapses in the final union.
#[must_use]
pub fn ordering_deps<'a>(task: &'a PipelineTask, from: &BTreeSet<String>) -> Vec<&'a str> {
    task.run_after
        .iter()
        .filter(|name| !from.contains(*name))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Param, ParamValue};
    use crate::spec::{
        PipelineTaskCondition, PipelineTaskInputResource, WhenExpression, WhenOperator,
    };
    use pretty_assertions::assert_eq;

    fn names(deps: &BTreeSet<String>) -> Vec<&str> {
        deps.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_plain_task_has_no_deps() {
        let task = PipelineTask::with_ref("solo", "t")
            .with_param(Param::new("msg", "no-reference-here"));
        assert!(task.deps().is_empty());
    }

    #[test]
    fn test_result_reference_in_param() {
        let task = PipelineTask::with_ref("deploy", "t")
            .with_param(Param::new("image", "$(tasks.build.results.image)"));
        assert_eq!(names(&task.deps()), vec!["build"]);
    }

    #[test]
    fn test_run_after_and_from_dedup() {
        let task = PipelineTask::with_ref("b", "t")
            .run_after(["a"])
            .with_input(PipelineTaskInputResource::new("src", "repo").with_from(["a"]));

        assert!(ordering_deps(&task, &from_deps(&task)).is_empty());
        assert_eq!(names(&task.deps()), vec!["a"]);
    }

    #[test]
    fn test_run_after_matching_param_ref_is_kept_then_merged() {
        let task = PipelineTask::with_ref("b", "t")
            .run_after(["a"])
            .with_param(Param::new("x", "$(tasks.a.results.out)"));

        assert_eq!(ordering_deps(&task, &from_deps(&task)), vec!["a"]);
        assert_eq!(names(&task.deps()), vec!["a"]);
    }

    #[test]
    fn test_all_sources_contribute() {
        let condition = PipelineTaskCondition {
            condition_ref: "is-ready".to_string(),
            params: vec![Param::new("status", "$(tasks.probe.results.status)")],
            resources: vec![PipelineTaskInputResource::new("cfg", "config").with_from(["render"])],
        };
        let task = PipelineTask::with_ref("release", "t")
            .with_input(PipelineTaskInputResource::new("src", "repo").with_from(["fetch"]))
            .with_condition(condition)
            .with_param(Param::new(
                "tags",
                ParamValue::array(["latest", "$(tasks.version.results.tag)"]),
            ))
            .with_when(WhenExpression::new(
                "$(tasks.gate.results.open)",
                WhenOperator::In,
                ["true"],
            ))
            .run_after(["audit"]);

        assert_eq!(
            names(&task.deps()),
            vec!["audit", "fetch", "gate", "probe", "render", "version"]
        );
    }

    #[test]
    fn test_deps_independent_of_declaration_order() {
        let gate = WhenExpression::new("$(tasks.gate.results.open)", WhenOperator::In, ["true"]);
        let flag = WhenExpression::new(
            "$(params.mode)",
            WhenOperator::NotIn,
            ["$(tasks.flag.results.value)"],
        );
        let src = PipelineTaskInputResource::new("src", "repo").with_from(["fetch"]);
        let cfg = PipelineTaskInputResource::new("cfg", "config").with_from(["render", "fetch"]);

        let forward = PipelineTask::with_ref("t", "t")
            .with_param(Param::new("a", "$(tasks.x.results.r)"))
            .with_param(Param::new("b", "$(tasks.y.results.r)"))
            .with_when(gate.clone())
            .with_when(flag.clone())
            .with_input(src.clone())
            .with_input(cfg.clone())
            .run_after(["z", "w"]);
        let backward = PipelineTask::with_ref("t", "t")
            .with_param(Param::new("b", "$(tasks.y.results.r)"))
            .with_param(Param::new("a", "$(tasks.x.results.r)"))
            .with_when(flag)
            .with_when(gate)
            .with_input(cfg)
            .with_input(src)
            .run_after(["w", "z"]);

        assert_eq!(forward.deps(), backward.deps());
        assert_eq!(
            names(&forward.deps()),
            vec!["fetch", "flag", "gate", "render", "w", "x", "y", "z"]
        );
    }

    #[test]
    fn test_non_result_expressions_add_nothing() {
        let task = PipelineTask::with_ref("t", "t")
            .with_param(Param::new("rev", "$(params.revision)"))
            .with_param(Param::new("run", "$(context.pipelineRun.name)"));
        assert!(task.deps().is_empty());
    }
}
