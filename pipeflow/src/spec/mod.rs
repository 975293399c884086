//! Pipeline document model.
//!
//! Field names and nesting follow the persisted representation of a
//! pipeline definition, so every type here round-trips through JSON and YAML.

mod pipeline;
mod resources;
mod task;
mod when;
mod workspace;

pub use pipeline::{
    ObjectMeta, Pipeline, PipelineResult, PipelineSpec, PipelineTask, PipelineTaskCondition,
    PIPELINE_API_VERSION, PIPELINE_KIND,
};
pub use resources::{
    PipelineDeclaredResource, PipelineTaskInputResource, PipelineTaskOutputResource,
    PipelineTaskResources,
};
pub use task::{EmbeddedTask, PipelineTaskMetadata, TaskKind, TaskRef, TaskResult, TaskSpec};
pub use when::{WhenExpression, WhenOperator};
pub use workspace::{PipelineWorkspaceDeclaration, WorkspaceDeclaration, WorkspacePipelineTaskBinding};
