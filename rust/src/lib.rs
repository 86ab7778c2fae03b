//! Project task-dependency scheduler.
//!
//! Keeps a project's precedence graph acyclic, computes its Critical Path
//! Method schedule and projects it into Gantt bars and links. Persistence is
//! delegated to a [`TaskStore`] collaborator.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDate;
use pyo3::prelude::*;

mod config;
pub mod critical_path;
pub mod cycle;
mod error;
pub mod gantt;
pub mod graph;
pub mod logging;
mod models;
pub mod service;
pub mod store;

pub use config::{SchedulerConfig, TerminalAnchor};
pub use critical_path::{
    analyze_critical_path, calculate_critical_path, CriticalPathAnalysis, CriticalPathError,
    CriticalPathResult, TaskMetrics, TaskTiming,
};
pub use cycle::{cycle_path, would_create_cycle};
pub use error::SchedulerError;
pub use gantt::{project_gantt, BarKind, GanttBar, GanttLink, GanttProjection};
pub use graph::{GraphError, TaskGraph, TaskIndex};
pub use models::{Dependency, DependencyType, Task};
pub use service::{weighted_progress, ScheduleService, SchedulerResult};
pub use store::{InMemoryTaskStore, StoreError, StoreResult, TaskStore};

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Check whether adding `candidate` to `existing` would close a cycle.
#[pyfunction]
#[pyo3(name = "would_create_cycle")]
fn py_would_create_cycle(existing: Vec<Dependency>, candidate: Dependency) -> bool {
    would_create_cycle(&existing, &candidate)
}

/// Compute the critical path for a project's tasks and dependencies.
///
/// # Arguments
/// * `project_id` - Project the tasks belong to
/// * `tasks` - All tasks of the project
/// * `dependencies` - All dependencies between those tasks
/// * `as_of` - Date offsets are rendered against (defaults to today)
/// * `config` - Scheduler configuration (defaults if omitted)
///
/// # Raises
/// * ValueError if a dependency references an unknown task
/// * RuntimeError if the dependencies contain a cycle
#[pyfunction]
#[pyo3(name = "critical_path", signature = (project_id, tasks, dependencies, as_of=None, config=None))]
fn py_critical_path(
    project_id: &str,
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    as_of: Option<NaiveDate>,
    config: Option<SchedulerConfig>,
) -> PyResult<CriticalPathAnalysis> {
    let config = config.unwrap_or_default();
    let graph = TaskGraph::new(tasks, dependencies).map_err(SchedulerError::from)?;
    analyze_critical_path(project_id, &graph, &config, as_of.unwrap_or_else(today))
        .map_err(|e| SchedulerError::from(e).into())
}

/// Schedule metrics for every task, critical or not.
#[pyfunction]
#[pyo3(name = "task_metrics", signature = (tasks, dependencies, as_of=None, config=None))]
fn py_task_metrics(
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    as_of: Option<NaiveDate>,
    config: Option<SchedulerConfig>,
) -> PyResult<Vec<TaskMetrics>> {
    let config = config.unwrap_or_default();
    let graph = TaskGraph::new(tasks, dependencies).map_err(SchedulerError::from)?;
    let result = calculate_critical_path(&graph, &config).map_err(SchedulerError::from)?;
    Ok(result.metrics(&graph, as_of.unwrap_or_else(today)))
}

/// Project tasks and dependencies into Gantt bars and links.
#[pyfunction]
#[pyo3(name = "gantt_data", signature = (tasks, dependencies, as_of=None, config=None))]
fn py_gantt_data(
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    as_of: Option<NaiveDate>,
    config: Option<SchedulerConfig>,
) -> PyResult<GanttProjection> {
    let config = config.unwrap_or_default();
    let graph = TaskGraph::new(tasks, dependencies).map_err(SchedulerError::from)?;
    Ok(project_gantt(&graph, &config, as_of.unwrap_or_else(today)))
}

/// Weighted completion percentage of a set of tasks, or None if empty.
#[pyfunction]
#[pyo3(name = "project_progress", signature = (tasks, config=None))]
fn py_project_progress(tasks: Vec<Task>, config: Option<SchedulerConfig>) -> Option<f64> {
    let config = config.unwrap_or_default();
    weighted_progress(&tasks, config.default_estimated_hours)
}

/// The project_scheduler Python module.
#[pymodule]
fn project_scheduler(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Task>()?;
    m.add_class::<Dependency>()?;
    m.add_class::<SchedulerConfig>()?;

    // Results
    m.add_class::<TaskMetrics>()?;
    m.add_class::<CriticalPathAnalysis>()?;
    m.add_class::<GanttBar>()?;
    m.add_class::<GanttLink>()?;
    m.add_class::<GanttProjection>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_would_create_cycle, m)?)?;
    m.add_function(wrap_pyfunction!(py_critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(py_task_metrics, m)?)?;
    m.add_function(wrap_pyfunction!(py_gantt_data, m)?)?;
    m.add_function(wrap_pyfunction!(py_project_progress, m)?)?;

    Ok(())
}
