//! Configuration types for the scheduler.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

/// Where the backward pass anchors tasks that have no successors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalAnchor {
    /// Each terminal task's late finish equals its own early finish.
    OwnEarlyFinish,
    /// Every terminal task's late finish equals the project duration.
    #[default]
    ProjectDuration,
}

impl TerminalAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalAnchor::OwnEarlyFinish => "own_early_finish",
            TerminalAnchor::ProjectDuration => "project_duration",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "own_early_finish" => Some(TerminalAnchor::OwnEarlyFinish),
            "project_duration" => Some(TerminalAnchor::ProjectDuration),
            _ => None,
        }
    }
}

/// Configuration for critical path analysis and service logging.
///
/// Embedding callers can load it from JSON; omitted fields take their defaults.
#[pyclass]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Backward pass anchor for tasks without successors.
    pub terminal_anchor: TerminalAnchor,
    /// Apply SS/FF/SF relations and lag in the CPM passes instead of plain FS with zero lag.
    #[pyo3(get, set)]
    pub honor_dependency_types: bool,
    /// Duration used when a task has no positive stored duration.
    #[pyo3(get, set)]
    pub default_duration_days: i64,
    /// Progress weight used when a task has no positive estimated hours.
    #[pyo3(get, set)]
    pub default_estimated_hours: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            terminal_anchor: TerminalAnchor::ProjectDuration,
            honor_dependency_types: false,
            default_duration_days: 1,
            default_estimated_hours: 1.0,
        }
    }
}

#[pymethods]
impl SchedulerConfig {
    #[new]
    #[pyo3(signature = (
        verbosity=None,
        terminal_anchor=None,
        honor_dependency_types=None,
        default_duration_days=None,
        default_estimated_hours=None
    ))]
    fn new(
        verbosity: Option<u8>,
        terminal_anchor: Option<&str>,
        honor_dependency_types: Option<bool>,
        default_duration_days: Option<i64>,
        default_estimated_hours: Option<f64>,
    ) -> PyResult<Self> {
        let defaults = Self::default();
        let terminal_anchor = match terminal_anchor {
            Some(value) => TerminalAnchor::parse(value).ok_or_else(|| {
                PyValueError::new_err(format!("Unknown terminal anchor: {}", value))
            })?,
            None => defaults.terminal_anchor,
        };
        Ok(Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            terminal_anchor,
            honor_dependency_types: honor_dependency_types
                .unwrap_or(defaults.honor_dependency_types),
            default_duration_days: default_duration_days
                .unwrap_or(defaults.default_duration_days)
                .max(1),
            default_estimated_hours: default_estimated_hours
                .unwrap_or(defaults.default_estimated_hours),
        })
    }

    #[getter(terminal_anchor)]
    fn py_terminal_anchor(&self) -> &'static str {
        self.terminal_anchor.as_str()
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulerConfig(verbosity={}, terminal_anchor={:?}, honor_dependency_types={})",
            self.verbosity,
            self.terminal_anchor.as_str(),
            self.honor_dependency_types
        )
    }
}
