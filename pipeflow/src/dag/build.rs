//! Graph construction and validation.

use super::{Dag, DagTask, Node};
use crate::errors::{
    CycleDetectedError, DuplicateTaskError, MissingDependencyError, PipeflowError,
};
use std::collections::{btree_set, BTreeMap, BTreeSet, HashSet};

/// Builds a validated graph from a list of tasks.
///
/// Every `(task, dependency)` pair becomes an edge `dependency -> task`.
/// Checks run in a fixed order: duplicate names, unresolved dependencies,
/// then cycles. A task that depends on itself is reported as a cycle.
///
/// # Errors
///
/// Returns the first structural error found; no partial graph is produced.
pub fn build<T: DagTask>(tasks: &[T]) -> Result<Dag, PipeflowError> {
    let mut nodes: BTreeMap<String, Node> = BTreeMap::new();
    let mut order = Vec::with_capacity(tasks.len());

    for task in tasks {
        let name = task.hash_key();
        if nodes.contains_key(name) {
            return Err(DuplicateTaskError::new(name).into());
        }
        nodes.insert(name.to_string(), Node::new(name));
        order.push(name.to_string());
    }

    // Dependencies are computed once and checked in declaration order.
    let deps: Vec<(String, BTreeSet<String>)> = tasks
        .iter()
        .map(|t| (t.hash_key().to_string(), t.deps()))
        .collect();

    for (name, task_deps) in &deps {
        if let Some(missing) = task_deps.iter().find(|d| !nodes.contains_key(*d)) {
            return Err(MissingDependencyError::new(name.clone(), missing.clone()).into());
        }
    }

    for (name, task_deps) in deps {
        for dep in &task_deps {
            if let Some(producer) = nodes.get_mut(dep) {
                producer.next.insert(name.clone());
            }
        }
        if let Some(node) = nodes.get_mut(&name) {
            node.prev = task_deps;
        }
    }

    detect_cycles(&nodes)?;

    let layers = layers(&nodes);
    tracing::debug!(
        tasks = nodes.len(),
        layers = layers.len(),
        "Built task graph"
    );

    Ok(Dag {
        nodes,
        order,
        layers,
    })
}

/// Detects cycles by walking predecessor edges depth-first, roots in name order.
fn detect_cycles(nodes: &BTreeMap<String, Node>) -> Result<(), CycleDetectedError> {
    let mut visited = HashSet::new();

    for (name, node) in nodes {
        if !visited.contains(name.as_str()) {
            if let Some(cycle) = dfs_cycle(nodes, node, &mut visited) {
                return Err(CycleDetectedError::new(cycle));
            }
        }
    }

    Ok(())
}

/// Depth-first search from `root` over an explicit stack.
fn dfs_cycle<'a>(
    nodes: &'a BTreeMap<String, Node>,
    root: &'a Node,
    visited: &mut HashSet<&'a str>,
) -> Option<Vec<String>> {
    let mut rec_stack: HashSet<&'a str> = HashSet::new();
    let mut path: Vec<&'a str> = Vec::new();
    let mut stack: Vec<(&'a str, btree_set::Iter<'a, String>)> = Vec::new();

    visited.insert(root.name.as_str());
    rec_stack.insert(root.name.as_str());
    path.push(root.name.as_str());
    stack.push((root.name.as_str(), root.prev.iter()));

    while let Some((node, deps)) = stack.last_mut() {
        let Some(dep) = deps.next() else {
            let node = *node;
            rec_stack.remove(node);
            path.pop();
            stack.pop();
            continue;
        };
        let dep = dep.as_str();

        if rec_stack.contains(dep) {
            let start = path.iter().position(|p| *p == dep).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
            cycle.push(dep.to_string());
            return Some(cycle);
        }
        if !visited.insert(dep) {
            continue;
        }
        if let Some(n) = nodes.get(dep) {
            rec_stack.insert(dep);
            path.push(dep);
            stack.push((dep, n.prev.iter()));
        }
    }

    None
}

/// Kahn's algorithm, one layer per round, names sorted within a layer.
fn layers(nodes: &BTreeMap<String, Node>) -> Vec<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = nodes
        .values()
        .map(|n| (n.name.as_str(), n.prev.len()))
        .collect();

    let mut current: Vec<&str> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut layers = Vec::new();

    while !current.is_empty() {
        let mut upcoming = BTreeSet::new();
        for name in &current {
            let Some(node) = nodes.get(*name) else { continue };
            for child in &node.next {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        upcoming.insert(child.as_str());
                    }
                }
            }
        }
        layers.push(current.iter().map(|s| (*s).to_string()).collect());
        current = upcoming.into_iter().collect();
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::codes;
    use crate::spec::PipelineTask;
    use pretty_assertions::assert_eq;

    /// A bare node for exercising the builder without pipeline tasks.
    struct Bare {
        name: &'static str,
        deps: &'static [&'static str],
    }

    impl DagTask for Bare {
        fn hash_key(&self) -> &str {
            self.name
        }

        fn deps(&self) -> BTreeSet<String> {
            self.deps.iter().map(|d| (*d).to_string()).collect()
        }
    }

    #[test]
    fn test_three_task_cycle() {
        let tasks = vec![
            PipelineTask::with_ref("a", "t").run_after(["b"]),
            PipelineTask::with_ref("b", "t").run_after(["c"]),
            PipelineTask::with_ref("c", "t").run_after(["a"]),
        ];

        let err = build(&tasks).unwrap_err();
        assert_eq!(err.code(), Some(codes::CYCLE));
        let PipeflowError::CycleDetected(cycle) = err else {
            panic!("expected cycle error");
        };
        assert_eq!(cycle.cycle_path, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let tasks = vec![PipelineTask::with_ref("a", "t").run_after(["a"])];

        assert_eq!(cycle_of(&tasks), vec!["a", "a"]);
    }

    #[test]
    fn test_self_result_reference_is_a_cycle() {
        let tasks = vec![PipelineTask::with_ref("a", "t")
            .with_param(crate::core::Param::new("x", "$(tasks.a.results.out)"))];

        assert_eq!(cycle_of(&tasks), vec!["a", "a"]);
    }

    #[test]
    fn test_missing_dependency() {
        let tasks = vec![
            PipelineTask::with_ref("a", "t"),
            PipelineTask::with_ref("b", "t").run_after(["ghost"]),
        ];

        let err = build(&tasks).unwrap_err();
        let PipeflowError::MissingDependency(missing) = err else {
            panic!("expected missing dependency error");
        };
        assert_eq!(missing.task, "b");
        assert_eq!(missing.missing, "ghost");
    }

    #[test]
    fn test_missing_dependency_checked_before_cycles() {
        let tasks = vec![
            PipelineTask::with_ref("a", "t").run_after(["b"]),
            PipelineTask::with_ref("b", "t").run_after(["a", "ghost"]),
        ];

        assert!(matches!(
            build(&tasks),
            Err(PipeflowError::MissingDependency(_))
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let tasks = vec![PipelineTask::with_ref("a", "t"), PipelineTask::with_ref("a", "u")];
        let err = build(&tasks).unwrap_err();
        assert_eq!(err.code(), Some(codes::DUPLICATE));
    }

    #[test]
    fn test_generic_over_dag_task() {
        let tasks = [
            Bare { name: "c", deps: &["a", "b"] },
            Bare { name: "b", deps: &["a"] },
            Bare { name: "a", deps: &[] },
        ];

        let dag = build(&tasks).unwrap();
        assert_eq!(dag.names(), &["c", "b", "a"]);
        assert_eq!(dag.topological_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_layers_independent_of_declaration_order() {
        let forward = [
            Bare { name: "a", deps: &[] },
            Bare { name: "b", deps: &[] },
            Bare { name: "c", deps: &["a"] },
            Bare { name: "d", deps: &["b", "c"] },
        ];
        let backward = [
            Bare { name: "d", deps: &["c", "b"] },
            Bare { name: "c", deps: &["a"] },
            Bare { name: "b", deps: &[] },
            Bare { name: "a", deps: &[] },
        ];

        let left = build(&forward).unwrap();
        let right = build(&backward).unwrap();
        assert_eq!(left.layers(), right.layers());
        assert_eq!(
            left.layers(),
            &[
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
                vec!["d".to_string()],
            ]
        );
    }

    #[test]
    fn test_cycle_path_independent_of_declaration_order() {
        let tasks = vec![
            PipelineTask::with_ref("c", "t").run_after(["a"]),
            PipelineTask::with_ref("b", "t").run_after(["c"]),
            PipelineTask::with_ref("a", "t").run_after(["b"]),
        ];

        assert_eq!(cycle_of(&tasks), vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_long_chain_builds_without_recursion() {
        let length = 20_000;
        let tasks: Vec<PipelineTask> = (0..length)
            .rev()
            .map(|i| {
                let task = PipelineTask::with_ref(format!("t{i}"), "t");
                if i == 0 {
                    task
                } else {
                    task.run_after([format!("t{}", i - 1)])
                }
            })
            .collect();

        let dag = build(&tasks).unwrap();
        assert_eq!(dag.len(), length);
        assert_eq!(dag.layers().len(), length);
        assert_eq!(dag.layers()[0], vec!["t0".to_string()]);
    }

    #[test]
    fn test_long_chain_closing_cycle_is_reported() {
        let length = 20_000;
        let tasks: Vec<PipelineTask> = (0..length)
            .map(|i| {
                let prev = if i == 0 { length - 1 } else { i - 1 };
                PipelineTask::with_ref(format!("t{i}"), "t").run_after([format!("t{prev}")])
            })
            .collect();

        assert_eq!(cycle_of(&tasks).len(), length + 1);
    }

    fn cycle_of(tasks: &[PipelineTask]) -> Vec<String> {
        match build(tasks) {
            Err(PipeflowError::CycleDetected(e)) => e.cycle_path,
            other => panic!("expected cycle error, got {other:?}"),
        }
    }
}
