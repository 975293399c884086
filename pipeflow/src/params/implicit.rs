//! Implicit propagation of pipeline parameters into embedded task specs.

use super::ParamScope;
use crate::spec::{PipelineSpec, PipelineTask};

/// Returns a copy of `spec` with pipeline parameters threaded into every
/// task that embeds its own task spec.
///
/// For such a task, its bindings become the scope's effective parameters
/// with the task's own bindings as overrides, and the embedded spec declares
/// every parameter visible at that level. Tasks using a reference are
/// returned unchanged.
#[must_use]
pub fn propagate_implicit_params(spec: &PipelineSpec) -> PipelineSpec {
    let scope = ParamScope::from_specs(&spec.params);
    let mut out = spec.clone();

    for task in out.tasks.iter_mut().chain(out.finally.iter_mut()) {
        propagate_into_task(&scope, task);
    }

    out
}

fn propagate_into_task(scope: &ParamScope, task: &mut PipelineTask) {
    let Some(embedded) = task.task_spec.as_mut() else {
        return;
    };

    let nested = scope
        .with_params(&task.params)
        .with_param_specs(&embedded.spec.params);
    embedded.spec.params = nested.effective_param_specs();
    task.params = scope.effective_params(&task.params);

    tracing::trace!(
        task = %task.name,
        params = task.params.len(),
        "Propagated implicit params"
    );
}
