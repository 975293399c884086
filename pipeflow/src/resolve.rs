//! Resolution entry points.
//!
//! [`resolve`] and [`Resolver::resolve`] turn a pipeline specification into a
//! [`ResolvedPipeline`]: a validated main graph, the finally plan and the
//! per-task retry and timeout budgets. [`propagate_params`] renders the
//! parameters a nested scope sees. These are what an external scheduler
//! consumes; nothing here runs a task.

use crate::cache::ResolutionCache;
use crate::config::ResolverConfig;
use crate::core::{Param, TaskStatus};
use crate::dag::{self, Dag, FinallyTasks};
use crate::errors::PipeflowError;
use crate::observability::{ResolveSpanAttributes, SpanTimer};
use crate::params::{propagate_implicit_params, ParamScope};
use crate::spec::{Pipeline, PipelineSpec, PipelineTask};
use crate::validation::validate_spec;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Retry and timeout budget of a task, passed through for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskBudget {
    /// Retries after a failure.
    pub retries: u32,
    /// Run timeout; the configured default when the task sets none.
    pub timeout: Duration,
}

/// The outcome of resolving a pipeline specification.
#[derive(Debug, Clone)]
pub struct ResolvedPipeline {
    /// Unique ID of this resolution.
    pub id: Uuid,
    /// Digest of the specification as submitted; `None` if it could not be
    /// serialized.
    pub digest: Option<String>,
    /// When the resolution happened.
    pub resolved_at: DateTime<Utc>,
    /// The specification after implicit parameter propagation.
    pub spec: PipelineSpec,
    /// The main task graph.
    pub dag: Dag,
    /// The finally tasks.
    pub finally: FinallyTasks,
    budgets: BTreeMap<String, TaskBudget>,
}

impl ResolvedPipeline {
    /// Returns the budget of a main or finally task.
    #[must_use]
    pub fn budget(&self, name: &str) -> Option<&TaskBudget> {
        self.budgets.get(name)
    }

    /// Returns a main or finally task by name.
    #[must_use]
    pub fn task(&self, name: &str) -> Option<&PipelineTask> {
        self.spec.all_tasks().find(|t| t.name == name)
    }

    /// Returns true once no main task is running or can still start.
    ///
    /// Tasks missing from `statuses` are pending. A pending task can only
    /// start after all of its predecessors succeeded, so the graph is
    /// finished when nothing runs and every pending task has a predecessor
    /// that failed, was skipped or was cancelled, directly or further up.
    #[must_use]
    pub fn main_graph_finished(&self, statuses: &HashMap<String, TaskStatus>) -> bool {
        let status = |name: &str| statuses.get(name).copied().unwrap_or_default();

        self.dag.names().iter().all(|name| match status(name.as_str()) {
            TaskStatus::Running => false,
            TaskStatus::Pending => self
                .dag
                .prev(name)
                .is_some_and(|prev| prev.iter().any(|p| !status(p.as_str()).is_success())),
            _ => true,
        })
    }

    /// Finally tasks to launch now.
    ///
    /// Empty until the main graph has finished, whether it succeeded or not.
    /// Finally tasks that have already started are left out.
    #[must_use]
    pub fn finally_ready(&self, statuses: &HashMap<String, TaskStatus>) -> Vec<String> {
        if !self.main_graph_finished(statuses) {
            return Vec::new();
        }
        self.finally
            .names()
            .iter()
            .filter(|name| {
                statuses.get(name.as_str()).copied().unwrap_or_default() == TaskStatus::Pending
            })
            .cloned()
            .collect()
    }
}

/// Resolves pipeline specifications under a configuration.
///
/// A resolver is cheap to share; successful resolutions are cached by spec
/// digest when the cache is enabled.
#[derive(Debug)]
pub struct Resolver {
    config: ResolverConfig,
    cache: Option<ResolutionCache>,
}

impl Resolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResolutionCache::new(&config.cache));
        Self { config, cache }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the cache, if enabled.
    #[must_use]
    pub fn cache(&self) -> Option<&ResolutionCache> {
        self.cache.as_ref()
    }

    /// Resolves a pipeline document.
    pub fn resolve_pipeline(&self, pipeline: &Pipeline) -> Result<Arc<ResolvedPipeline>, PipeflowError> {
        tracing::debug!(pipeline = %pipeline.name(), "Resolving pipeline");
        self.resolve(&pipeline.spec)
    }

    /// Resolves a pipeline specification.
    ///
    /// # Errors
    ///
    /// Returns the first structural error; nothing is cached on failure.
    pub fn resolve(&self, spec: &PipelineSpec) -> Result<Arc<ResolvedPipeline>, PipeflowError> {
        self.resolve_keyed(spec, spec.digest())
    }

    /// Resolves under a cache key; without a key the cache is bypassed.
    fn resolve_keyed(
        &self,
        spec: &PipelineSpec,
        digest: Option<String>,
    ) -> Result<Arc<ResolvedPipeline>, PipeflowError> {
        let timer = SpanTimer::start("pipeline.resolve");
        let mut attrs = ResolveSpanAttributes::new(spec.tasks.len(), spec.finally.len());
        match &digest {
            Some(d) => attrs = attrs.with_digest(d.clone()),
            None => tracing::warn!("Pipeline spec could not be digested; bypassing cache"),
        }

        let cache = self.cache.as_ref().zip(digest.as_deref());
        if let Some(hit) = cache.and_then(|(c, d)| c.get(d)) {
            tracing::debug!(
                attributes = ?attrs.with_cache_hit(true).to_attributes(),
                "Resolution cache hit"
            );
            return Ok(hit);
        }

        match resolve_with(spec, digest.clone(), &self.config) {
            Ok(resolved) => {
                let resolved = Arc::new(resolved);
                if let Some((cache, digest)) = cache {
                    cache.insert(digest, Arc::clone(&resolved));
                }
                let attrs = attrs
                    .with_resolution_id(resolved.id.to_string())
                    .with_layer_count(resolved.dag.layers().len())
                    .with_cache_hit(false);
                tracing::info!(
                    attributes = ?attrs.to_attributes(),
                    duration_ms = timer.finish(),
                    "Resolved pipeline"
                );
                Ok(resolved)
            }
            Err(err) => {
                let attrs = attrs.with_error_code(err.code().unwrap_or_default());
                tracing::warn!(
                    attributes = ?attrs.to_attributes(),
                    error = %err,
                    duration_ms = timer.finish(),
                    "Pipeline resolution failed"
                );
                Err(err)
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

/// Resolves a specification with the default configuration and no cache.
///
/// # Errors
///
/// Returns the first structural error found.
pub fn resolve(spec: &PipelineSpec) -> Result<ResolvedPipeline, PipeflowError> {
    resolve_with(spec, spec.digest(), &ResolverConfig::default())
}

/// Renders the parameters a nested scope sees given the caller's overrides.
///
/// Overrides are passed through; every other parameter in `scope` becomes a
/// `$(params.<name>)` reference. The output is sorted by name.
#[must_use]
pub fn propagate_params(scope: &ParamScope, overrides: &[Param]) -> Vec<Param> {
    scope.effective_params(overrides)
}

fn resolve_with(
    spec: &PipelineSpec,
    digest: Option<String>,
    config: &ResolverConfig,
) -> Result<ResolvedPipeline, PipeflowError> {
    let spec = if config.implicit_params {
        propagate_implicit_params(spec)
    } else {
        spec.clone()
    };

    validate_spec(&spec, config)?;
    let dag = dag::build(&spec.tasks)?;
    let finally = FinallyTasks::build(&spec.finally, &dag)?;

    let default_timeout = config.default_task_timeout();
    let budgets = spec
        .all_tasks()
        .map(|t| {
            let budget = TaskBudget {
                retries: t.retries,
                timeout: t.timeout.unwrap_or(default_timeout),
            };
            (t.name.clone(), budget)
        })
        .collect();

    Ok(ResolvedPipeline {
        id: Uuid::new_v4(),
        digest,
        resolved_at: Utc::now(),
        spec,
        dag,
        finally,
        budgets,
    })
}
