//! Span attributes and timing for pipeline resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Attributes describing one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSpanAttributes {
    /// Resolution ID.
    pub resolution_id: Option<String>,
    /// Spec digest.
    pub digest: Option<String>,
    /// Number of main tasks.
    pub task_count: usize,
    /// Number of finally tasks.
    pub finally_count: usize,
    /// Number of topological layers.
    pub layer_count: Option<usize>,
    /// Whether the result came from the cache.
    pub cache_hit: Option<bool>,
    /// Error code if resolution failed.
    pub error_code: Option<String>,
}

impl ResolveSpanAttributes {
    /// Creates attributes for a spec of the given size.
    #[must_use]
    pub fn new(task_count: usize, finally_count: usize) -> Self {
        Self {
            task_count,
            finally_count,
            ..Self::default()
        }
    }

    /// Sets the resolution ID.
    #[must_use]
    pub fn with_resolution_id(mut self, id: impl Into<String>) -> Self {
        self.resolution_id = Some(id.into());
        self
    }

    /// Sets the spec digest.
    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Sets the layer count.
    #[must_use]
    pub fn with_layer_count(mut self, layers: usize) -> Self {
        self.layer_count = Some(layers);
        self
    }

    /// Records whether the cache answered.
    #[must_use]
    pub fn with_cache_hit(mut self, hit: bool) -> Self {
        self.cache_hit = Some(hit);
        self
    }

    /// Sets the error code.
    #[must_use]
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Flattens to `pipeline.*` keys.
    #[must_use]
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();

        attrs.insert("pipeline.task_count".to_string(), self.task_count.to_string());
        attrs.insert(
            "pipeline.finally_count".to_string(),
            self.finally_count.to_string(),
        );
        if let Some(ref v) = self.resolution_id {
            attrs.insert("pipeline.resolution_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.digest {
            attrs.insert("pipeline.digest".to_string(), v.clone());
        }
        if let Some(v) = self.layer_count {
            attrs.insert("pipeline.layer_count".to_string(), v.to_string());
        }
        if let Some(v) = self.cache_hit {
            attrs.insert("pipeline.cache_hit".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error_code {
            attrs.insert("pipeline.error_code".to_string(), v.clone());
        }

        attrs
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}
