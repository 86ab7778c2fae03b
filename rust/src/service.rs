//! Schedule service: the only component that talks to the task store.
//!
//! Reads build a fresh [`TaskGraph`] per call; nothing is cached between
//! requests. Writes to a project's dependency set are serialized per project
//! so a cycle check and the insert that follows it are atomic with respect
//! to other writers of the same project.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::warn;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::critical_path::{
    analyze_critical_path, calculate_critical_path, CriticalPathAnalysis, TaskMetrics,
};
use crate::cycle::cycle_path;
use crate::error::SchedulerError;
use crate::gantt::{project_gantt, GanttProjection};
use crate::graph::TaskGraph;
use crate::models::{Dependency, DependencyType, Task};
use crate::store::{StoreError, TaskStore};
use crate::{log_changes, log_checks};

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Registry of per-project write guards.
#[derive(Default)]
struct ProjectLocks {
    guards: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    fn handle(&self, project_id: &str) -> Arc<Mutex<()>> {
        self.guards
            .lock()
            .entry(project_id.to_string())
            .or_default()
            .clone()
    }
}

/// Weighted completion of a set of tasks, as a percentage rounded to 2 decimals.
///
/// Each task weighs its estimated hours (`default_hours` when unset or zero).
/// Returns `None` for an empty task set.
pub fn weighted_progress(tasks: &[Task], default_hours: f64) -> Option<f64> {
    if tasks.is_empty() {
        return None;
    }
    let (done, total) = tasks.iter().fold((0.0, 0.0), |(done, total), task| {
        let weight = task.progress_weight(default_hours);
        (done + weight * task.progress_fraction(), total + weight)
    });
    if total <= 0.0 {
        return Some(0.0);
    }
    Some((done / total * 100.0 * 100.0).round() / 100.0)
}

/// Orchestrates cycle checks, CPM analysis and Gantt projection over a task store.
pub struct ScheduleService<S: TaskStore> {
    store: S,
    config: SchedulerConfig,
    locks: ProjectLocks,
}

impl<S: TaskStore> ScheduleService<S> {
    pub fn new(store: S, config: SchedulerConfig) -> Self {
        Self {
            store,
            config,
            locks: ProjectLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn reject<T>(&self, operation: &str, err: SchedulerError) -> SchedulerResult<T> {
        warn!(operation, error = %err, "schedule operation rejected");
        Err(err)
    }

    fn load_graph(&self, project_id: &str) -> SchedulerResult<TaskGraph> {
        let tasks = self.store.list_tasks(project_id)?;
        let dependencies = self.store.list_dependencies(project_id)?;
        Ok(TaskGraph::new(tasks, dependencies)?)
    }

    /// Add a dependency after checking, in memory, that it does not close a cycle.
    ///
    /// Both tasks must belong to `project_id`. Nothing is written when any check fails.
    pub fn create_dependency(
        &self,
        project_id: &str,
        predecessor_id: &str,
        successor_id: &str,
        dependency_type: DependencyType,
        lag: i64,
    ) -> SchedulerResult<Dependency> {
        if predecessor_id == successor_id {
            log_checks!(self.config.verbosity, task = predecessor_id, "self-loop rejected");
            return self.reject(
                "create_dependency",
                SchedulerError::CyclicDependency {
                    predecessor: predecessor_id.to_string(),
                    successor: successor_id.to_string(),
                },
            );
        }

        let handle = self.locks.handle(project_id);
        let _guard = handle.lock();

        let tasks = self.store.list_tasks(project_id)?;
        for task_id in [predecessor_id, successor_id] {
            if !tasks.iter().any(|t| t.id == task_id) {
                return self.reject(
                    "create_dependency",
                    SchedulerError::NotFound(format!("Task {} in project {}", task_id, project_id)),
                );
            }
        }

        let existing = self.store.list_dependencies(project_id)?;
        let candidate = Dependency::new(
            Uuid::new_v4().to_string(),
            project_id,
            predecessor_id,
            successor_id,
            dependency_type,
            lag,
        );

        if let Some(path) = cycle_path(&existing, &candidate) {
            log_checks!(
                self.config.verbosity,
                cycle = %path.join(" -> "),
                "candidate dependency closes a cycle"
            );
            return self.reject(
                "create_dependency",
                SchedulerError::CyclicDependency {
                    predecessor: predecessor_id.to_string(),
                    successor: successor_id.to_string(),
                },
            );
        }

        self.store.insert_dependency(candidate.clone())?;
        log_changes!(
            self.config.verbosity,
            project = project_id,
            predecessor = predecessor_id,
            successor = successor_id,
            dependency_type = candidate.dependency_type.as_str(),
            lag,
            "dependency created"
        );
        Ok(candidate)
    }

    /// Remove the edge between two tasks. Removing an edge cannot create a cycle.
    pub fn delete_dependency(&self, predecessor_id: &str, successor_id: &str) -> SchedulerResult<()> {
        let project_id = match self.store.get_task(predecessor_id) {
            Ok(task) => Some(task.project_id),
            Err(StoreError::NotFound { .. }) => None,
            Err(err) => return Err(err.into()),
        };
        let handle = project_id.as_deref().map(|id| self.locks.handle(id));
        let _guard = handle.as_ref().map(|h| h.lock());

        self.store.delete_dependency(predecessor_id, successor_id)?;
        log_changes!(
            self.config.verbosity,
            predecessor = predecessor_id,
            successor = successor_id,
            "dependency deleted"
        );
        Ok(())
    }

    /// Delete a task that has no incident dependencies.
    pub fn delete_task(&self, task_id: &str) -> SchedulerResult<()> {
        let task = self.store.get_task(task_id)?;
        let handle = self.locks.handle(&task.project_id);
        let _guard = handle.lock();

        let count = self
            .store
            .list_dependencies(&task.project_id)?
            .iter()
            .filter(|d| d.touches(task_id))
            .count();
        if count > 0 {
            log_checks!(self.config.verbosity, task = task_id, count, "task still has dependencies");
            return self.reject(
                "delete_task",
                SchedulerError::HasDependents {
                    task_id: task_id.to_string(),
                    count,
                },
            );
        }

        self.store.delete_task(task_id)?;
        log_changes!(self.config.verbosity, task = task_id, "task deleted");
        Ok(())
    }

    /// Critical path of a project, with dates relative to `as_of`.
    pub fn get_critical_path(
        &self,
        project_id: &str,
        as_of: NaiveDate,
    ) -> SchedulerResult<CriticalPathAnalysis> {
        let graph = self.load_graph(project_id)?;
        match analyze_critical_path(project_id, &graph, &self.config, as_of) {
            Ok(analysis) => Ok(analysis),
            Err(err) => self.reject("get_critical_path", err.into()),
        }
    }

    /// Schedule metrics for every task of a project, critical or not, in
    /// topological order.
    pub fn get_task_metrics(&self, project_id: &str, as_of: NaiveDate) -> SchedulerResult<Vec<TaskMetrics>> {
        let graph = self.load_graph(project_id)?;
        match calculate_critical_path(&graph, &self.config) {
            Ok(result) => Ok(result.metrics(&graph, as_of)),
            Err(err) => self.reject("get_task_metrics", err.into()),
        }
    }

    /// Gantt bars and links of a project; undated tasks fall back to `as_of`.
    pub fn get_gantt_data(&self, project_id: &str, as_of: NaiveDate) -> SchedulerResult<GanttProjection> {
        let graph = self.load_graph(project_id)?;
        Ok(project_gantt(&graph, &self.config, as_of))
    }

    /// Recompute and persist the project's weighted progress.
    ///
    /// Returns the persisted percentage, or `None` without writing when the
    /// project has no tasks.
    pub fn recompute_project_progress(&self, project_id: &str) -> SchedulerResult<Option<f64>> {
        let tasks = self.store.list_tasks(project_id)?;
        let Some(percent) = weighted_progress(&tasks, self.config.default_estimated_hours) else {
            return Ok(None);
        };

        self.store.update_project_progress(project_id, percent)?;
        log_changes!(self.config.verbosity, project = project_id, percent, "project progress updated");
        Ok(Some(percent))
    }
}
