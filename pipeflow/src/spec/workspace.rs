//! Workspace declarations and bindings.

use serde::{Deserialize, Serialize};

/// A workspace the pipeline expects to be provided by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineWorkspaceDeclaration {
    /// Workspace name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether a run may omit the workspace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Maps a pipeline workspace onto a workspace declared by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePipelineTaskBinding {
    /// Workspace name as declared by the task.
    pub name: String,
    /// Pipeline workspace to bind.
    pub workspace: String,
    /// Sub-directory of the pipeline workspace to expose.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
}

/// A workspace declared by a task specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDeclaration {
    /// Workspace name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Mount path inside the task's containers.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount_path: String,
    /// Whether the workspace is mounted read-only.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    /// Whether a run may omit the workspace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}
