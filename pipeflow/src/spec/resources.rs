//! Resource declarations and bindings.

use serde::{Deserialize, Serialize};

/// A resource the pipeline expects to be given when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDeclaredResource {
    /// Name used by pipeline tasks to refer to the resource.
    pub name: String,
    /// Resource type (e.g. `git`, `image`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the resource may be omitted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Input and output resource bindings of a pipeline task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTaskResources {
    /// Input bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PipelineTaskInputResource>,
    /// Output bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PipelineTaskOutputResource>,
}

/// Binds a declared resource to a task input.
///
/// `from` names the tasks that must produce the resource first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTaskInputResource {
    /// Input name as declared by the task.
    pub name: String,
    /// Declared pipeline resource to bind.
    pub resource: String,
    /// Producing tasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
}

impl PipelineTaskInputResource {
    /// Creates an input binding with no producers.
    #[must_use]
    pub fn new(name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            from: Vec::new(),
        }
    }

    /// Adds producing tasks.
    #[must_use]
    pub fn with_from<I, S>(mut self, from: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from.extend(from.into_iter().map(Into::into));
        self
    }
}

/// Binds a declared resource to a task output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTaskOutputResource {
    /// Output name as declared by the task.
    pub name: String,
    /// Declared pipeline resource to bind.
    pub resource: String,
}
