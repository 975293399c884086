//! Resolution of task references to task specifications.
//!
//! The object store holding task definitions is an external collaborator;
//! [`TaskLookup`] is the seam it plugs into.

use crate::errors::TaskNotFoundError;
use crate::spec::{PipelineTask, TaskKind, TaskRef, TaskSpec};
use std::borrow::Cow;
use std::collections::HashMap;

/// Looks up a task definition by reference.
#[cfg_attr(test, mockall::automock)]
pub trait TaskLookup: Send + Sync {
    /// Returns the task specification a reference points at.
    fn get_task(&self, task_ref: &TaskRef) -> Result<TaskSpec, TaskNotFoundError>;
}

/// A lookup backed by an in-memory map, keyed by kind and name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskLookup {
    tasks: HashMap<(TaskKind, String), TaskSpec>,
}

impl InMemoryTaskLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a namespaced task.
    #[must_use]
    pub fn with_task(self, name: impl Into<String>, spec: TaskSpec) -> Self {
        self.with_kind(TaskKind::Task, name, spec)
    }

    /// Adds a task of the given kind.
    #[must_use]
    pub fn with_kind(mut self, kind: TaskKind, name: impl Into<String>, spec: TaskSpec) -> Self {
        self.insert(kind, name, spec);
        self
    }

    /// Inserts or replaces a task.
    pub fn insert(&mut self, kind: TaskKind, name: impl Into<String>, spec: TaskSpec) {
        self.tasks.insert((kind, name.into()), spec);
    }

    /// Returns the number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskLookup for InMemoryTaskLookup {
    fn get_task(&self, task_ref: &TaskRef) -> Result<TaskSpec, TaskNotFoundError> {
        self.tasks
            .get(&(task_ref.kind, task_ref.name.clone()))
            .cloned()
            .ok_or_else(|| TaskNotFoundError::new(task_ref.name.clone()))
    }
}

/// Returns the specification a pipeline task runs.
///
/// An embedded spec is borrowed as is; a reference goes through `lookup`.
///
/// # Errors
///
/// Returns an error if the reference cannot be resolved, or if the task has
/// neither a reference nor an embedded spec.
pub fn resolve_task_spec<'a, L>(
    task: &'a PipelineTask,
    lookup: &L,
) -> Result<Cow<'a, TaskSpec>, TaskNotFoundError>
where
    L: TaskLookup + ?Sized,
{
    if let Some(embedded) = &task.task_spec {
        return Ok(Cow::Borrowed(&embedded.spec));
    }
    match &task.task_ref {
        Some(task_ref) => {
            tracing::debug!(task = %task.name, reference = %task_ref.name, "Looking up task");
            lookup.get_task(task_ref).map(Cow::Owned)
        }
        None => Err(TaskNotFoundError::new(task.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ParamSpec, ParamType};
    use mockall::predicate::function;

    #[test]
    fn test_in_memory_lookup() {
        let lookup = InMemoryTaskLookup::new()
            .with_task("git-clone", TaskSpec::new().with_result("commit"))
            .with_kind(TaskKind::ClusterTask, "kaniko", TaskSpec::new());

        assert_eq!(lookup.len(), 2);
        let spec = lookup.get_task(&TaskRef::new("git-clone")).unwrap();
        assert_eq!(spec.results[0].name, "commit");

        // Same name, different kind.
        assert!(lookup.get_task(&TaskRef::new("kaniko")).is_err());
    }

    #[test]
    fn test_embedded_spec_is_borrowed() {
        let task = PipelineTask::with_spec(
            "inline",
            TaskSpec::new().with_param(ParamSpec::new("p", ParamType::String)),
        );
        let mut lookup = MockTaskLookup::new();
        lookup.expect_get_task().never();

        let spec = resolve_task_spec(&task, &lookup).unwrap();
        assert!(matches!(spec, Cow::Borrowed(_)));
        assert_eq!(spec.params[0].name, "p");
    }

    #[test]
    fn test_reference_goes_through_lookup() {
        let task = PipelineTask::with_ref("fetch", "git-clone");
        let mut lookup = MockTaskLookup::new();
        lookup
            .expect_get_task()
            .with(function(|r: &TaskRef| r.name == "git-clone"))
            .times(1)
            .returning(|_| Ok(TaskSpec::new().with_result("commit")));

        let spec = resolve_task_spec(&task, &lookup).unwrap();
        assert_eq!(spec.results[0].name, "commit");
    }

    #[test]
    fn test_missing_reference() {
        let task = PipelineTask::with_ref("fetch", "nope");
        let err = resolve_task_spec(&task, &InMemoryTaskLookup::new()).unwrap_err();
        assert_eq!(err.name, "nope");
    }
}
