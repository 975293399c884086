//! Task graph construction and topological layering.
//!
//! This module contains:
//! - The [`DagTask`] capability every graph node implements
//! - Dependency extraction for pipeline tasks
//! - The validated [`Dag`] with predecessor/successor sets and layers
//! - Validation and producer tracking for finally tasks

mod build;
mod deps;
mod finally;

pub use build::build;
pub use deps::{from_deps, ordering_deps, resource_deps, result_ref_deps};
pub use finally::FinallyTasks;

use crate::errors::UnknownTaskError;
use std::collections::{BTreeMap, BTreeSet};

/// A node that can be placed in a [`Dag`].
pub trait DagTask {
    /// Stable identity of the node.
    fn hash_key(&self) -> &str;

    /// Names of the nodes this one depends on, deduplicated and sorted.
    fn deps(&self) -> BTreeSet<String>;
}

/// A vertex of the graph with its incident edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Task name.
    pub name: String,
    /// Tasks that must finish before this one.
    pub prev: BTreeSet<String>,
    /// Tasks waiting on this one.
    pub next: BTreeSet<String>,
}

impl Node {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A validated, acyclic task graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dag {
    nodes: BTreeMap<String, Node>,
    /// Declaration order.
    order: Vec<String>,
    layers: Vec<Vec<String>>,
}

impl Dag {
    /// Returns the node for a task.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Returns the predecessors of a task.
    #[must_use]
    pub fn prev(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|n| &n.prev)
    }

    /// Returns the successors of a task.
    #[must_use]
    pub fn next(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|n| &n.next)
    }

    /// Returns true if the task is part of the graph.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Task names in declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Tasks without predecessors, sorted by name.
    #[must_use]
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.prev.is_empty())
            .map(|n| n.name.as_str())
            .collect()
    }

    /// Tasks without successors, sorted by name.
    #[must_use]
    pub fn leaves(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.next.is_empty())
            .map(|n| n.name.as_str())
            .collect()
    }

    /// Topological layers.
    ///
    /// Every task of a layer has all of its predecessors in earlier layers,
    /// so a scheduler may run a whole layer concurrently. Names within a
    /// layer are sorted.
    #[must_use]
    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    /// A single topological order: the layers, flattened.
    #[must_use]
    pub fn topological_order(&self) -> Vec<&str> {
        self.layers.iter().flatten().map(String::as_str).collect()
    }

    /// Returns the tasks that may start once `done` have completed.
    ///
    /// A task is schedulable when it is not itself in `done` and every one of
    /// its predecessors is. The result is sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `done` names a task outside the graph.
    pub fn schedulable<'a, I>(&self, done: I) -> Result<Vec<String>, UnknownTaskError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut finished = BTreeSet::new();
        for name in done {
            if !self.nodes.contains_key(name) {
                return Err(UnknownTaskError::new(name));
            }
            finished.insert(name);
        }

        Ok(self
            .nodes
            .values()
            .filter(|n| !finished.contains(n.name.as_str()))
            .filter(|n| n.prev.iter().all(|p| finished.contains(p.as_str())))
            .map(|n| n.name.clone())
            .collect())
    }
}
