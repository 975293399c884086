//! Task references and embedded task specifications.

use super::WorkspaceDeclaration;
use crate::core::ParamSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of object a task reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskKind {
    /// A namespaced task.
    #[default]
    Task,
    /// A cluster-scoped task.
    ClusterTask,
}

/// A reference to a task definition stored elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    /// Name of the referenced task.
    pub name: String,
    /// Kind of the referenced task.
    #[serde(default)]
    pub kind: TaskKind,
    /// API version of the referenced task.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    /// Bundle image holding the task, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bundle: String,
}

impl TaskRef {
    /// Creates a reference to a namespaced task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Task,
            api_version: String::new(),
            bundle: String::new(),
        }
    }
}

/// A result declared by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Result name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A task specification.
///
/// Only the fields that parameter and dependency resolution look at are
/// typed; everything else (steps, sidecars, volumes, ...) is kept verbatim in
/// `extra` so that documents survive a read/write cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Declared parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    /// Declared results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TaskResult>,
    /// Declared workspaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceDeclaration>,
    /// Fields not interpreted here.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TaskSpec {
    /// Creates an empty task specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declared parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Adds a declared result.
    #[must_use]
    pub fn with_result(mut self, name: impl Into<String>) -> Self {
        self.results.push(TaskResult {
            name: name.into(),
            description: String::new(),
        });
        self
    }
}

/// Labels and annotations propagated to the runs of an embedded task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTaskMetadata {
    /// Labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl PipelineTaskMetadata {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.annotations.is_empty()
    }
}

/// A task specification embedded directly in a pipeline task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedTask {
    /// Metadata for the generated runs.
    #[serde(default, skip_serializing_if = "PipelineTaskMetadata::is_empty")]
    pub metadata: PipelineTaskMetadata,
    /// The inline specification.
    #[serde(flatten)]
    pub spec: TaskSpec,
}

impl EmbeddedTask {
    /// Wraps a task specification without metadata.
    #[must_use]
    pub fn new(spec: TaskSpec) -> Self {
        Self {
            metadata: PipelineTaskMetadata::default(),
            spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ParamType;

    #[test]
    fn test_embedded_task_keeps_unknown_fields() {
        let json = r#"{
            "metadata": {"labels": {"team": "ci"}},
            "params": [{"name": "url", "type": "string"}],
            "steps": [{"name": "clone", "image": "alpine/git"}]
        }"#;
        let embedded: EmbeddedTask = serde_json::from_str(json).unwrap();

        assert_eq!(embedded.metadata.labels.get("team"), Some(&"ci".to_string()));
        assert_eq!(embedded.spec.params[0].kind, Some(ParamType::String));
        assert!(embedded.spec.extra.contains_key("steps"));

        let back = serde_json::to_value(&embedded).unwrap();
        assert_eq!(back["steps"][0]["image"], "alpine/git");
        assert_eq!(back["metadata"]["labels"]["team"], "ci");
    }

    #[test]
    fn test_task_ref_defaults_to_namespaced_kind() {
        let task_ref: TaskRef = serde_json::from_str(r#"{"name": "git-clone"}"#).unwrap();
        assert_eq!(task_ref.kind, TaskKind::Task);
    }
}
