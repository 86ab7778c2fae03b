//! Projection of a task graph into Gantt bars and links.

use chrono::NaiveDate;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::graph::TaskGraph;
use crate::models::{Dependency, Task};

/// How a bar is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarKind {
    /// Top-level task without a parent.
    Project,
    Task,
    Milestone,
}

impl BarKind {
    /// Milestones win over hierarchy; otherwise parented tasks are plain tasks.
    pub fn classify(task: &Task) -> Self {
        if task.is_milestone {
            BarKind::Milestone
        } else if task.parent_id.is_some() {
            BarKind::Task
        } else {
            BarKind::Project
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BarKind::Project => "project",
            BarKind::Task => "task",
            BarKind::Milestone => "milestone",
        }
    }
}

#[pyclass]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GanttBar {
    #[pyo3(get)]
    pub id: String,
    #[pyo3(get)]
    pub text: String,
    #[pyo3(get)]
    pub start_date: NaiveDate,
    #[pyo3(get)]
    pub end_date: NaiveDate,
    #[pyo3(get)]
    pub duration: i64,
    /// 0.0 to 1.0.
    #[pyo3(get)]
    pub progress: f64,
    #[pyo3(get)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub kind: BarKind,
    #[pyo3(get)]
    pub open: bool,
}

#[pymethods]
impl GanttBar {
    #[getter]
    fn r#type(&self) -> &'static str {
        self.kind.as_str()
    }

    fn __repr__(&self) -> String {
        format!(
            "GanttBar(id={:?}, start={}, end={}, type={})",
            self.id,
            self.start_date,
            self.end_date,
            self.kind.as_str()
        )
    }
}

#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttLink {
    #[pyo3(get)]
    pub id: String,
    #[pyo3(get)]
    pub source: String,
    #[pyo3(get)]
    pub target: String,
    /// "0" FS, "1" SS, "2" FF, "3" SF.
    #[pyo3(get)]
    #[serde(rename = "type")]
    pub link_type: String,
    #[pyo3(get)]
    pub lag: i64,
}

/// Bars and links for one project, in graph order.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GanttProjection {
    #[pyo3(get)]
    pub tasks: Vec<GanttBar>,
    #[pyo3(get)]
    pub links: Vec<GanttLink>,
}

#[pymethods]
impl GanttProjection {
    fn __repr__(&self) -> String {
        format!(
            "GanttProjection(tasks={}, links={})",
            self.tasks.len(),
            self.links.len()
        )
    }
}

fn project_bar(task: &Task, config: &SchedulerConfig, as_of: NaiveDate) -> GanttBar {
    GanttBar {
        id: task.id.clone(),
        text: task.name.clone(),
        start_date: task.planned_start(as_of),
        end_date: task.planned_end(as_of),
        duration: task.duration_days(config.default_duration_days),
        progress: task.progress_fraction(),
        parent: task.parent_id.clone(),
        kind: BarKind::classify(task),
        open: true,
    }
}

fn project_link(dep: &Dependency) -> GanttLink {
    GanttLink {
        id: dep.id.clone(),
        source: dep.predecessor_id.clone(),
        target: dep.successor_id.clone(),
        link_type: dep.dependency_type.gantt_code().to_string(),
        lag: dep.lag,
    }
}

/// Map every task to a bar and every dependency to a link.
///
/// Independent of CPM results; tasks without dates fall back to `as_of`.
pub fn project_gantt(graph: &TaskGraph, config: &SchedulerConfig, as_of: NaiveDate) -> GanttProjection {
    GanttProjection {
        tasks: graph
            .tasks()
            .iter()
            .map(|task| project_bar(task, config, as_of))
            .collect(),
        links: graph.dependencies().iter().map(project_link).collect(),
    }
}
