//! # Pipeflow
//!
//! Dependency graph and parameter resolution for declarative task pipelines.
//!
//! Given a pipeline of named tasks, pipeflow works out what depends on what
//! and checks the result before anything runs:
//!
//! - **Dependency extraction**: edges from resource bindings, `$(tasks.x.results.y)`
//!   references, when expressions, deprecated conditions and `runAfter`
//! - **Graph validation**: unknown tasks, cycles (with the full path) and
//!   finally-task cross references are fatal
//! - **Topological layers**: groups of tasks a scheduler may run together
//! - **Parameter scopes**: pipeline parameters threaded into nested task
//!   specs as `$(params.x)` references
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pipeflow::prelude::*;
//!
//! let pipeline = Pipeline::from_yaml_str(document)?;
//! let resolved = Resolver::new(ResolverConfig::default()).resolve(&pipeline.spec)?;
//!
//! for layer in resolved.dag.layers() {
//!     println!("{}", layer.join(", "));
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod config;
pub mod core;
pub mod dag;
pub mod errors;
pub mod lookup;
pub mod observability;
pub mod params;
pub mod resolve;
pub mod spec;
pub mod substitution;
pub mod validation;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::ResolutionCache;
    pub use crate::config::{CacheConfig, LogFormat, LoggingConfig, ResolverConfig};
    pub use crate::core::{Param, ParamSpec, ParamType, ParamValue, TaskStatus};
    pub use crate::dag::{Dag, DagTask, FinallyTasks};
    pub use crate::errors::{
        CycleDetectedError, DuplicateTaskError, ErrorInfo, FinallyReferenceError,
        MissingDependencyError, PipeflowError, PipelineValidationError,
    };
    pub use crate::lookup::{resolve_task_spec, InMemoryTaskLookup, TaskLookup};
    pub use crate::observability::init_logging;
    pub use crate::params::{propagate_implicit_params, ParamScope};
    pub use crate::resolve::{propagate_params, resolve, ResolvedPipeline, Resolver, TaskBudget};
    pub use crate::spec::{
        Pipeline, PipelineSpec, PipelineTask, TaskRef, TaskSpec, WhenExpression, WhenOperator,
    };
    pub use crate::validation::validate_spec;
}
