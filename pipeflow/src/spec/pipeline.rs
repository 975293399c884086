//! Pipeline documents: the declarative task graph and its parameters.

use super::{
    EmbeddedTask, PipelineDeclaredResource, PipelineTaskInputResource, PipelineTaskResources,
    PipelineWorkspaceDeclaration, TaskRef, TaskSpec, WhenExpression,
    WorkspacePipelineTaskBinding,
};
use crate::core::{duration, Param, ParamSpec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

/// API version written by [`Pipeline::new`].
pub const PIPELINE_API_VERSION: &str = "tekton.dev/v1beta1";

/// Object kind written by [`Pipeline::new`].
pub const PIPELINE_KIND: &str = "Pipeline";

/// Identity of a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Object namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A named pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// API version of the document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    /// Object kind of the document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Object identity.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(default)]
    pub spec: PipelineSpec,
}

impl Pipeline {
    /// Creates a pipeline with the given name and specification.
    #[must_use]
    pub fn new(name: impl Into<String>, spec: PipelineSpec) -> Self {
        Self {
            api_version: PIPELINE_API_VERSION.to_string(),
            kind: PIPELINE_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            spec,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Parses a pipeline from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid pipeline.
    pub fn from_yaml_str(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(input)
    }

    /// Parses a pipeline from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid pipeline.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Renders the pipeline as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Renders the pipeline as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A value the pipeline outputs once it has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Result name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Expression producing the value, typically a task result reference.
    pub value: String,
}

/// The desired state of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Declared resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<PipelineDeclaredResource>,
    /// The main task graph.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<PipelineTask>,
    /// Declared input parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    /// Declared workspaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<PipelineWorkspaceDeclaration>,
    /// Declared results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<PipelineResult>,
    /// Tasks run once the main graph has finished.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finally: Vec<PipelineTask>,
}

impl PipelineSpec {
    /// Creates an empty specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a main-graph task.
    #[must_use]
    pub fn with_task(mut self, task: PipelineTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Adds a finally task.
    #[must_use]
    pub fn with_finally(mut self, task: PipelineTask) -> Self {
        self.finally.push(task);
        self
    }

    /// Adds a declared parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Adds a declared result.
    #[must_use]
    pub fn with_result(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.results.push(PipelineResult {
            name: name.into(),
            description: String::new(),
            value: value.into(),
        });
        self
    }

    /// Iterates over main and finally tasks, main first.
    pub fn all_tasks(&self) -> impl Iterator<Item = &PipelineTask> {
        self.tasks.iter().chain(self.finally.iter())
    }

    /// Returns a stable content digest of this specification.
    ///
    /// Two specifications with the same digest resolve to the same graph.
    /// Returns `None` if the specification cannot be serialized.
    #[must_use]
    pub fn digest(&self) -> Option<String> {
        let json = serde_json::to_vec(self).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&json);
        let result = hasher.finalize();
        Some(hex::encode(&result[..16]))
    }
}

/// A deprecated guard: a named condition check with its own bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTaskCondition {
    /// Name of the condition to evaluate.
    pub condition_ref: String,
    /// Parameters passed to the condition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    /// Resources provided to the condition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<PipelineTaskInputResource>,
}

/// A node of the pipeline graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTask {
    /// Name, unique across main and finally tasks.
    #[serde(default)]
    pub name: String,
    /// Reference to a stored task definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<TaskRef>,
    /// Inline task definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_spec: Option<EmbeddedTask>,
    /// Deprecated guards.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PipelineTaskCondition>,
    /// Guards.
    #[serde(default, rename = "when", skip_serializing_if = "Vec::is_empty")]
    pub when_expressions: Vec<WhenExpression>,
    /// How many times to retry after a failure.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retries: u32,
    /// Tasks that must finish before this one starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
    /// Resource bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<PipelineTaskResources>,
    /// Parameter bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    /// Workspace bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspacePipelineTaskBinding>,
    /// Run timeout; the resolver's configured default applies when unset.
    #[serde(
        default,
        with = "duration::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

// serde's skip_serializing_if hands the field by reference.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl PipelineTask {
    /// Creates a task referencing a stored task definition.
    #[must_use]
    pub fn with_ref(name: impl Into<String>, task_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_ref: Some(TaskRef::new(task_ref)),
            ..Self::default()
        }
    }

    /// Creates a task with an inline task definition.
    #[must_use]
    pub fn with_spec(name: impl Into<String>, spec: TaskSpec) -> Self {
        Self {
            name: name.into(),
            task_spec: Some(EmbeddedTask::new(spec)),
            ..Self::default()
        }
    }

    /// Adds explicit predecessors.
    #[must_use]
    pub fn run_after<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_after.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds a parameter binding.
    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Adds a when expression.
    #[must_use]
    pub fn with_when(mut self, expression: WhenExpression) -> Self {
        self.when_expressions.push(expression);
        self
    }

    /// Adds a deprecated condition.
    #[must_use]
    pub fn with_condition(mut self, condition: PipelineTaskCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds an input resource binding.
    #[must_use]
    pub fn with_input(mut self, input: PipelineTaskInputResource) -> Self {
        self.resources
            .get_or_insert_with(PipelineTaskResources::default)
            .inputs
            .push(input);
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the input resource bindings.
    #[must_use]
    pub fn input_resources(&self) -> &[PipelineTaskInputResource] {
        self.resources.as_ref().map_or(&[], |r| r.inputs.as_slice())
    }
}
