//! Finally tasks: the pipeline's cleanup and reporting stage.
//!
//! Finally tasks are not part of the main graph. They all become runnable
//! together once the main graph has reached a terminal state, so they may
//! not order themselves against any task. They may still read main-task
//! results; those producers are recorded for the scheduler but do not gate
//! anything here.

use super::{from_deps, result_ref_deps, Dag};
use crate::errors::{
    DuplicateTaskError, FinallyReferenceError, FinallyReferenceKind, MissingDependencyError,
    PipeflowError,
};
use crate::spec::PipelineTask;
use std::collections::{BTreeMap, BTreeSet};

/// Validated finally tasks and the main tasks whose results they read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinallyTasks {
    names: Vec<String>,
    producers: BTreeMap<String, BTreeSet<String>>,
}

impl FinallyTasks {
    /// Validates finally tasks against the main graph.
    ///
    /// # Errors
    ///
    /// - [`DuplicateTaskError`] if a name repeats or shadows a main task.
    /// - [`FinallyReferenceError`] for `runAfter`, resource `from`, or a
    ///   result reference to another finally task.
    /// - [`MissingDependencyError`] for a result reference to an unknown task.
    pub fn build(finally: &[PipelineTask], main: &Dag) -> Result<Self, PipeflowError> {
        let own: BTreeSet<&str> = finally.iter().map(|t| t.name.as_str()).collect();
        let mut names = Vec::with_capacity(finally.len());
        let mut producers = BTreeMap::new();

        for task in finally {
            if main.contains(&task.name) || names.contains(&task.name) {
                return Err(DuplicateTaskError::new(task.name.clone()).into());
            }

            if let Some(first) = task.run_after.first() {
                return Err(FinallyReferenceError::new(
                    task.name.clone(),
                    first.clone(),
                    FinallyReferenceKind::RunAfter,
                )
                .into());
            }

            if let Some(first) = from_deps(task).into_iter().next() {
                return Err(FinallyReferenceError::new(
                    task.name.clone(),
                    first,
                    FinallyReferenceKind::ResourceFrom,
                )
                .into());
            }

            let mut reads = BTreeSet::new();
            for producer in result_ref_deps(task) {
                if own.contains(producer.as_str()) {
                    return Err(FinallyReferenceError::new(
                        task.name.clone(),
                        producer,
                        FinallyReferenceKind::FinallyResult,
                    )
                    .into());
                }
                if !main.contains(&producer) {
                    return Err(MissingDependencyError::new(task.name.clone(), producer).into());
                }
                reads.insert(producer);
            }

            names.push(task.name.clone());
            producers.insert(task.name.clone(), reads);
        }

        Ok(Self { names, producers })
    }

    /// Finally task names in declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Main tasks whose results a finally task reads.
    #[must_use]
    pub fn producers(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.producers.get(name)
    }

    /// Returns true if the task is a finally task.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.producers.contains_key(name)
    }

    /// Returns the number of finally tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if there are no finally tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Param;
    use crate::dag::build;
    use crate::errors::codes;
    use crate::spec::PipelineTaskInputResource;

    fn main_graph() -> Dag {
        build(&[
            PipelineTask::with_ref("build", "t"),
            PipelineTask::with_ref("test", "t").run_after(["build"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_records_main_task_producers() {
        let finally = vec![
            PipelineTask::with_ref("report", "t")
                .with_param(Param::new("image", "$(tasks.build.results.image)")),
            PipelineTask::with_ref("cleanup", "t"),
        ];

        let tasks = FinallyTasks::build(&finally, &main_graph()).unwrap();
        assert_eq!(tasks.names(), &["report", "cleanup"]);
        assert_eq!(
            tasks.producers("report").unwrap().iter().collect::<Vec<_>>(),
            vec!["build"]
        );
        assert!(tasks.producers("cleanup").unwrap().is_empty());
        assert!(tasks.contains("cleanup"));
        assert!(!tasks.contains("build"));
    }

    #[test]
    fn test_run_after_is_rejected() {
        let finally = vec![
            PipelineTask::with_ref("a", "t"),
            PipelineTask::with_ref("b", "t").run_after(["a"]),
        ];

        let err = FinallyTasks::build(&finally, &main_graph()).unwrap_err();
        assert_eq!(err.code(), Some(codes::FINALLY_REF));
        let PipeflowError::FinallyReference(e) = err else {
            panic!("expected finally reference error");
        };
        assert_eq!(e.kind, FinallyReferenceKind::RunAfter);
        assert_eq!(e.reference, "a");
    }

    #[test]
    fn test_run_after_main_task_is_rejected() {
        let finally = vec![PipelineTask::with_ref("a", "t").run_after(["build"])];
        assert!(FinallyTasks::build(&finally, &main_graph()).is_err());
    }

    #[test]
    fn test_resource_from_is_rejected() {
        let finally = vec![PipelineTask::with_ref("a", "t")
            .with_input(PipelineTaskInputResource::new("img", "image").with_from(["build"]))];

        let err = FinallyTasks::build(&finally, &main_graph()).unwrap_err();
        let PipeflowError::FinallyReference(e) = err else {
            panic!("expected finally reference error");
        };
        assert_eq!(e.kind, FinallyReferenceKind::ResourceFrom);
    }

    #[test]
    fn test_result_of_other_finally_task_is_rejected() {
        let finally = vec![
            PipelineTask::with_ref("a", "t"),
            PipelineTask::with_ref("b", "t").with_param(Param::new("x", "$(tasks.a.results.r)")),
        ];

        let err = FinallyTasks::build(&finally, &main_graph()).unwrap_err();
        let PipeflowError::FinallyReference(e) = err else {
            panic!("expected finally reference error");
        };
        assert_eq!(e.kind, FinallyReferenceKind::FinallyResult);
    }

    #[test]
    fn test_result_of_unknown_task_is_missing() {
        let finally = vec![
            PipelineTask::with_ref("a", "t").with_param(Param::new("x", "$(tasks.ghost.results.r)")),
        ];

        assert!(matches!(
            FinallyTasks::build(&finally, &main_graph()),
            Err(PipeflowError::MissingDependency(_))
        ));
    }

    #[test]
    fn test_name_shared_with_main_task() {
        let finally = vec![PipelineTask::with_ref("build", "t")];
        let err = FinallyTasks::build(&finally, &main_graph()).unwrap_err();
        assert_eq!(err.code(), Some(codes::DUPLICATE));
    }
}
