//! Core data types for project tasks and their precedence constraints.

use chrono::NaiveDate;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

/// Precedence relationship between a predecessor and a successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DependencyType {
    /// Successor starts after predecessor finishes.
    #[default]
    #[serde(rename = "FS")]
    FinishToStart,
    /// Successor starts after predecessor starts.
    #[serde(rename = "SS")]
    StartToStart,
    /// Successor finishes after predecessor finishes.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Successor finishes after predecessor starts.
    #[serde(rename = "SF")]
    StartToFinish,
    /// Any stored code outside the four known relations.
    #[serde(rename = "UNKNOWN")]
    #[serde(other)]
    Unrecognized,
}

impl DependencyType {
    /// Parse a stored type code. Unknown codes become `Unrecognized` rather than failing.
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "FS" => DependencyType::FinishToStart,
            "SS" => DependencyType::StartToStart,
            "FF" => DependencyType::FinishToFinish,
            "SF" => DependencyType::StartToFinish,
            _ => DependencyType::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
            DependencyType::Unrecognized => "UNKNOWN",
        }
    }

    /// Numeric link code used by Gantt renderers.
    pub fn gantt_code(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "0",
            DependencyType::StartToStart => "1",
            DependencyType::FinishToFinish => "2",
            DependencyType::StartToFinish => "3",
            DependencyType::Unrecognized => "0",
        }
    }
}

/// A unit of work within exactly one project.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub project_id: String,
    #[pyo3(get, set)]
    pub name: String,
    /// Stored duration in whole days; unset or non-positive values schedule as the default.
    #[pyo3(get, set)]
    #[serde(default)]
    pub duration: Option<i64>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub expected_start_date: Option<NaiveDate>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub expected_end_date: Option<NaiveDate>,
    /// 0-100.
    #[pyo3(get, set)]
    #[serde(default)]
    pub percent_complete: u8,
    #[pyo3(get, set)]
    #[serde(default)]
    pub parent_id: Option<String>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub is_milestone: bool,
    #[pyo3(get, set)]
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

impl Task {
    /// Create a task with no dates, no parent and zero progress.
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        name: impl Into<String>,
        duration: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            name: name.into(),
            duration,
            start_date: None,
            end_date: None,
            expected_start_date: None,
            expected_end_date: None,
            percent_complete: 0,
            parent_id: None,
            is_milestone: false,
            estimated_hours: None,
        }
    }

    /// Duration used for scheduling; never below 1.
    pub fn duration_days(&self, default_days: i64) -> i64 {
        match self.duration {
            Some(days) if days >= 1 => days,
            _ => default_days.max(1),
        }
    }

    /// Weight of this task in the project progress roll-up.
    pub fn progress_weight(&self, default_hours: f64) -> f64 {
        match self.estimated_hours {
            Some(hours) if hours > 0.0 => hours,
            _ => default_hours,
        }
    }

    /// Completion as a fraction in [0, 1].
    pub fn progress_fraction(&self) -> f64 {
        f64::from(self.percent_complete.min(100)) / 100.0
    }

    /// Explicit start, else expected start, else `as_of`.
    pub fn planned_start(&self, as_of: NaiveDate) -> NaiveDate {
        self.start_date.or(self.expected_start_date).unwrap_or(as_of)
    }

    /// Explicit end, else expected end, else `as_of`.
    pub fn planned_end(&self, as_of: NaiveDate) -> NaiveDate {
        self.end_date.or(self.expected_end_date).unwrap_or(as_of)
    }
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (
        id,
        project_id,
        name,
        duration=None,
        start_date=None,
        end_date=None,
        expected_start_date=None,
        expected_end_date=None,
        percent_complete=0,
        parent_id=None,
        is_milestone=false,
        estimated_hours=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        id: String,
        project_id: String,
        name: String,
        duration: Option<i64>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        expected_start_date: Option<NaiveDate>,
        expected_end_date: Option<NaiveDate>,
        percent_complete: u8,
        parent_id: Option<String>,
        is_milestone: bool,
        estimated_hours: Option<f64>,
    ) -> Self {
        Self {
            id,
            project_id,
            name,
            duration,
            start_date,
            end_date,
            expected_start_date,
            expected_end_date,
            percent_complete,
            parent_id,
            is_milestone,
            estimated_hours,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, name={:?}, duration={:?}, percent_complete={})",
            self.id, self.name, self.duration, self.percent_complete
        )
    }
}

/// A directed precedence constraint between two tasks of the same project.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub project_id: String,
    #[pyo3(get, set)]
    pub predecessor_id: String,
    #[pyo3(get, set)]
    pub successor_id: String,
    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,
    /// Days; negative values are leads.
    #[pyo3(get, set)]
    #[serde(default)]
    pub lag: i64,
}

impl Dependency {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
        dependency_type: DependencyType,
        lag: i64,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            dependency_type,
            lag,
        }
    }

    /// True if `task_id` is either end of this edge.
    pub fn touches(&self, task_id: &str) -> bool {
        self.predecessor_id == task_id || self.successor_id == task_id
    }

    pub fn is_self_loop(&self) -> bool {
        self.predecessor_id == self.successor_id
    }
}

#[pymethods]
impl Dependency {
    #[new]
    #[pyo3(signature = (predecessor_id, successor_id, dependency_type="FS", lag=0, id=None, project_id=None))]
    fn py_new(
        predecessor_id: String,
        successor_id: String,
        dependency_type: &str,
        lag: i64,
        id: Option<String>,
        project_id: Option<String>,
    ) -> Self {
        let id = id.unwrap_or_else(|| format!("{}->{}", predecessor_id, successor_id));
        Self {
            id,
            project_id: project_id.unwrap_or_default(),
            predecessor_id,
            successor_id,
            dependency_type: DependencyType::parse(dependency_type),
            lag,
        }
    }

    #[getter(dependency_type)]
    fn py_dependency_type(&self) -> &'static str {
        self.dependency_type.as_str()
    }

    #[setter(dependency_type)]
    fn py_set_dependency_type(&mut self, value: &str) {
        self.dependency_type = DependencyType::parse(value);
    }

    fn __repr__(&self) -> String {
        format!(
            "Dependency(predecessor_id={:?}, successor_id={:?}, type={}, lag={})",
            self.predecessor_id,
            self.successor_id,
            self.dependency_type.as_str(),
            self.lag
        )
    }
}
