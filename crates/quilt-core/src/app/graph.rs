//! Job graph and the reference walker.
//!
//! Design:
//! - Forward edges: task -> tasks it depends on (waits for)
//! - Reverse edges: task -> tasks that depend on it (waiting tasks)
//! - Invariant: edges and reverse_edges must be kept in sync
//!
//! The walk order is fixed when the graph is built: dependencies first,
//! ties broken by declaration order (Kahn's algorithm over a min-heap of
//! declaration positions). The report depends on evaluation order, so the
//! same job file always walks the same way.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use thiserror::Error;

use crate::domain::{JobSpec, Task, TaskId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate task_id={0}")]
    DuplicateTask(TaskId),

    #[error("task_id={task} depends on unknown task_id={missing}")]
    UnknownDependency { task: TaskId, missing: TaskId },

    #[error("dependency cycle: {}", format_cycle(.0))]
    Cycle(Vec<TaskId>),
}

fn format_cycle(cycle: &[TaskId]) -> String {
    cycle
        .iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A validated, acyclic task graph with its walk order.
#[derive(Debug)]
pub struct JobGraph {
    tasks: Vec<Task>,

    /// Forward edges by declaration position: task -> tasks it waits for.
    edges: HashMap<usize, BTreeSet<usize>>,

    /// Reverse edges: task -> tasks waiting for it.
    reverse_edges: HashMap<usize, BTreeSet<usize>>,

    order: Vec<usize>,
}

impl JobGraph {
    pub fn from_spec(spec: JobSpec) -> Result<Self, GraphError> {
        let mut positions: HashMap<TaskId, usize> = HashMap::with_capacity(spec.tasks.len());
        for (position, entry) in spec.tasks.iter().enumerate() {
            if positions.insert(entry.task.id().clone(), position).is_some() {
                return Err(GraphError::DuplicateTask(entry.task.id().clone()));
            }
        }

        let mut edges: HashMap<usize, BTreeSet<usize>> = HashMap::new();
        let mut reverse_edges: HashMap<usize, BTreeSet<usize>> = HashMap::new();
        for (position, entry) in spec.tasks.iter().enumerate() {
            for dependency in &entry.dependencies {
                let Some(&depends_on) = positions.get(dependency) else {
                    return Err(GraphError::UnknownDependency {
                        task: entry.task.id().clone(),
                        missing: dependency.clone(),
                    });
                };
                edges.entry(position).or_default().insert(depends_on);
                reverse_edges.entry(depends_on).or_default().insert(position);
            }
        }

        let tasks: Vec<Task> = spec.tasks.into_iter().map(|entry| entry.task).collect();
        let mut graph = Self {
            tasks,
            edges,
            reverse_edges,
            order: Vec::new(),
        };
        graph.order = graph.topological_order()?;
        Ok(graph)
    }

    /// A graph with no edges: tasks are walked in the given order.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, GraphError> {
        Self::from_spec(JobSpec {
            tasks: tasks.into_iter().map(crate::domain::TaskSpec::new).collect(),
            event: Default::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in walk order.
    pub fn walk(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().map(move |&position| &self.tasks[position])
    }

    fn topological_order(&self) -> Result<Vec<usize>, GraphError> {
        let mut pending: Vec<usize> = (0..self.tasks.len())
            .map(|p| self.edges.get(&p).map_or(0, BTreeSet::len))
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(p, _)| Reverse(p))
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(Reverse(position)) = ready.pop() {
            order.push(position);
            for &waiting in self.reverse_edges.get(&position).into_iter().flatten() {
                pending[waiting] -= 1;
                if pending[waiting] == 0 {
                    ready.push(Reverse(waiting));
                }
            }
        }

        if order.len() == self.tasks.len() {
            Ok(order)
        } else {
            Err(GraphError::Cycle(self.find_cycle(&pending)))
        }
    }

    /// Every task Kahn could not release still waits on another unreleased
    /// task, so following those edges from any of them must loop.
    fn find_cycle(&self, pending: &[usize]) -> Vec<TaskId> {
        let stuck = |p: usize| pending[p] > 0;
        let Some(start) = (0..self.tasks.len()).find(|&p| stuck(p)) else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut seen: HashMap<usize, usize> = HashMap::new();
        let mut current = start;
        loop {
            if let Some(&at) = seen.get(&current) {
                let mut cycle: Vec<TaskId> =
                    path[at..].iter().map(|&p| self.tasks[p].id().clone()).collect();
                cycle.push(self.tasks[current].id().clone());
                return cycle;
            }
            seen.insert(current, path.len());
            path.push(current);

            let next = self
                .edges
                .get(&current)
                .and_then(|deps| deps.iter().copied().find(|&d| stuck(d)));
            match next {
                Some(n) => current = n,
                None => return path.iter().map(|&p| self.tasks[p].id().clone()).collect(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskSpec;
    use serde_json::json;

    fn spec(id: &str, deps: &[&str]) -> TaskSpec {
        deps.iter().fold(
            TaskSpec::new(Task::new(id, "run_test", json!({"change": "A"}))),
            |s, d| s.depends_on(*d),
        )
    }

    fn job(tasks: Vec<TaskSpec>) -> JobSpec {
        JobSpec {
            tasks,
            event: Default::default(),
        }
    }

    fn walk_ids(graph: &JobGraph) -> Vec<&str> {
        graph.walk().map(|t| t.id().as_str()).collect()
    }

    #[test]
    fn new_graph_is_empty() {
        let graph = JobGraph::from_spec(job(vec![])).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.walk().count(), 0);
    }

    #[test]
    fn dependencies_are_walked_first() {
        let graph = JobGraph::from_spec(job(vec![
            spec("analysis", &["read"]),
            spec("read", &["test"]),
            spec("test", &["build"]),
            spec("build", &[]),
        ]))
        .unwrap();
        assert_eq!(walk_ids(&graph), vec!["build", "test", "read", "analysis"]);
    }

    #[test]
    fn independent_tasks_keep_declaration_order() {
        let graph = JobGraph::from_tasks(vec![
            Task::new("b", "find_isolate", json!({})),
            Task::new("a", "find_isolate", json!({})),
            Task::new("c", "find_isolate", json!({})),
        ])
        .unwrap();
        assert_eq!(walk_ids(&graph), vec!["b", "a", "c"]);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn task_waits_for_every_dependency() {
        // C depends on both A and B
        let graph = JobGraph::from_spec(job(vec![
            spec("c", &["b", "a"]),
            spec("a", &[]),
            spec("b", &[]),
        ]))
        .unwrap();
        assert_eq!(walk_ids(&graph), vec!["a", "b", "c"]);
    }

    #[test]
    fn dag_with_diamond_is_walked_once_per_task() {
        //     a
        //    / \
        //   b   c
        //    \ /
        //     d
        let graph = JobGraph::from_spec(job(vec![
            spec("d", &["b", "c"]),
            spec("c", &["a"]),
            spec("b", &["a"]),
            spec("a", &[]),
        ]))
        .unwrap();
        assert_eq!(walk_ids(&graph), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn detect_simple_cycle() {
        let err = JobGraph::from_spec(job(vec![spec("a", &["b"]), spec("b", &["a"])])).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle(vec![TaskId::new("a"), TaskId::new("b"), TaskId::new("a")])
        );
    }

    #[test]
    fn detect_self_dependency() {
        let err = JobGraph::from_spec(job(vec![spec("a", &["a"])])).unwrap_err();
        assert_eq!(err, GraphError::Cycle(vec![TaskId::new("a"), TaskId::new("a")]));
    }

    #[test]
    fn detect_longer_cycle_behind_a_root() {
        // a <- b <- c <- d <- b
        let err = JobGraph::from_spec(job(vec![
            spec("a", &[]),
            spec("b", &["a", "d"]),
            spec("c", &["b"]),
            spec("d", &["c"]),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "dependency cycle: b -> d -> c -> b");
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let err = JobGraph::from_spec(job(vec![spec("a", &["ghost"])])).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownDependency {
                task: TaskId::new("a"),
                missing: TaskId::new("ghost"),
            }
        );
    }

    #[test]
    fn duplicate_task_is_rejected() {
        let err = JobGraph::from_spec(job(vec![spec("a", &[]), spec("a", &[])])).unwrap_err();
        assert_eq!(err, GraphError::DuplicateTask(TaskId::new("a")));
    }
}
