//! In-memory task graph for one project.
//!
//! Tasks live in an arena addressed by dense indices; string ids are only
//! resolved at the boundary. Adjacency is stored as dependency indices so
//! callers can still see the edge's type and lag.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use thiserror::Error;

use crate::models::{Dependency, Task};

/// Position of a task in the graph's arena.
pub type TaskIndex = usize;

/// Errors raised while building or querying a task graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),
    #[error("Dependency {dependency_id} references unknown task {task_id}")]
    DanglingDependency {
        dependency_id: String,
        task_id: String,
    },
    #[error("Circular dependency detected in task graph")]
    CircularDependency,
}

/// Read-only view of a project's tasks and precedence edges.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    index: FxHashMap<String, TaskIndex>,
    /// (predecessor, successor) per dependency, parallel to `dependencies`.
    ends: Vec<(TaskIndex, TaskIndex)>,
    /// Dependency indices keyed by predecessor.
    outgoing: Vec<Vec<usize>>,
    /// Dependency indices keyed by successor.
    incoming: Vec<Vec<usize>>,
}

impl TaskGraph {
    /// Build a graph from tasks and dependencies, preserving their input order.
    ///
    /// Every dependency endpoint must be one of `tasks`.
    pub fn new(tasks: Vec<Task>, dependencies: Vec<Dependency>) -> Result<Self, GraphError> {
        let mut index: FxHashMap<String, TaskIndex> =
            FxHashMap::with_capacity_and_hasher(tasks.len(), Default::default());
        for (idx, task) in tasks.iter().enumerate() {
            if index.insert(task.id.clone(), idx).is_some() {
                return Err(GraphError::DuplicateTask(task.id.clone()));
            }
        }

        let n = tasks.len();
        let mut ends = Vec::with_capacity(dependencies.len());
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (edge, dep) in dependencies.iter().enumerate() {
            let resolve = |task_id: &str| {
                index
                    .get(task_id)
                    .copied()
                    .ok_or_else(|| GraphError::DanglingDependency {
                        dependency_id: dep.id.clone(),
                        task_id: task_id.to_string(),
                    })
            };
            let pred = resolve(&dep.predecessor_id)?;
            let succ = resolve(&dep.successor_id)?;
            ends.push((pred, succ));
            outgoing[pred].push(edge);
            incoming[succ].push(edge);
        }

        Ok(Self {
            tasks,
            dependencies,
            index,
            ends,
            outgoing,
            incoming,
        })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    #[inline]
    pub fn index_of(&self, task_id: &str) -> Option<TaskIndex> {
        self.index.get(task_id).copied()
    }

    #[inline]
    pub fn task_at(&self, idx: TaskIndex) -> &Task {
        &self.tasks[idx]
    }

    /// Look up a task by id.
    pub fn task(&self, task_id: &str) -> Result<&Task, GraphError> {
        self.index_of(task_id)
            .map(|idx| &self.tasks[idx])
            .ok_or_else(|| GraphError::TaskNotFound(task_id.to_string()))
    }

    /// Dependencies whose predecessor is `task_id`.
    pub fn successors_of(&self, task_id: &str) -> Result<Vec<&Dependency>, GraphError> {
        let idx = self
            .index_of(task_id)
            .ok_or_else(|| GraphError::TaskNotFound(task_id.to_string()))?;
        Ok(self.outgoing[idx]
            .iter()
            .map(|&edge| &self.dependencies[edge])
            .collect())
    }

    /// Dependencies whose successor is `task_id`.
    pub fn predecessors_of(&self, task_id: &str) -> Result<Vec<&Dependency>, GraphError> {
        let idx = self
            .index_of(task_id)
            .ok_or_else(|| GraphError::TaskNotFound(task_id.to_string()))?;
        Ok(self.incoming[idx]
            .iter()
            .map(|&edge| &self.dependencies[edge])
            .collect())
    }

    /// Outgoing edges of a task as (successor index, dependency).
    pub fn outgoing(&self, idx: TaskIndex) -> impl Iterator<Item = (TaskIndex, &Dependency)> + '_ {
        self.outgoing[idx]
            .iter()
            .map(move |&edge| (self.ends[edge].1, &self.dependencies[edge]))
    }

    /// Incoming edges of a task as (predecessor index, dependency).
    pub fn incoming(&self, idx: TaskIndex) -> impl Iterator<Item = (TaskIndex, &Dependency)> + '_ {
        self.incoming[idx]
            .iter()
            .map(move |&edge| (self.ends[edge].0, &self.dependencies[edge]))
    }

    /// Order tasks so every predecessor comes before its successors (Kahn's algorithm).
    ///
    /// Ties keep input order. Fails instead of looping when the edges contain a cycle.
    pub fn topological_order(&self) -> Result<Vec<TaskIndex>, GraphError> {
        let n = self.tasks.len();
        let mut in_degree: Vec<usize> = self.incoming.iter().map(Vec::len).collect();

        let mut queue: VecDeque<TaskIndex> = (0..n).filter(|&idx| in_degree[idx] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for &edge in &self.outgoing[idx] {
                let succ = self.ends[edge].1;
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    queue.push_back(succ);
                }
            }
        }

        if order.len() != n {
            return Err(GraphError::CircularDependency);
        }
        Ok(order)
    }
}
