//! Types for critical path analysis.

use chrono::{Days, NaiveDate};
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for critical path calculation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriticalPathError {
    #[error("Circular dependency detected in task graph")]
    CircularDependency,
}

/// Per-task timing from the forward and backward passes, in days from the analysis date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    /// Earliest possible start (forward pass).
    pub early_start: i64,
    /// Earliest possible finish (forward pass).
    pub early_finish: i64,
    /// Latest allowable start (backward pass).
    pub late_start: i64,
    /// Latest allowable finish (backward pass).
    pub late_finish: i64,
    /// late_start - early_start.
    pub total_float: i64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.total_float == 0
    }
}

/// Offset a date by a signed number of days, saturating at the calendar bounds.
pub(crate) fn offset_date(anchor: NaiveDate, days: i64) -> NaiveDate {
    let result = if days >= 0 {
        anchor.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        anchor.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    result.unwrap_or(if days >= 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    })
}

/// Schedule metrics for one task as returned to callers.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetrics {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub task_name: String,
    #[pyo3(get)]
    pub duration: i64,
    #[pyo3(get)]
    pub early_start: i64,
    #[pyo3(get)]
    pub early_finish: i64,
    #[pyo3(get)]
    pub late_start: i64,
    #[pyo3(get)]
    pub late_finish: i64,
    #[pyo3(get)]
    pub total_float: i64,
    #[pyo3(get)]
    pub is_critical: bool,
    #[pyo3(get)]
    pub early_start_date: NaiveDate,
    #[pyo3(get)]
    pub early_finish_date: NaiveDate,
    #[pyo3(get)]
    pub late_start_date: NaiveDate,
    #[pyo3(get)]
    pub late_finish_date: NaiveDate,
}

impl TaskMetrics {
    pub fn from_timing(
        task_id: &str,
        task_name: &str,
        duration: i64,
        timing: &TaskTiming,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            task_id: task_id.to_string(),
            task_name: task_name.to_string(),
            duration,
            early_start: timing.early_start,
            early_finish: timing.early_finish,
            late_start: timing.late_start,
            late_finish: timing.late_finish,
            total_float: timing.total_float,
            is_critical: timing.is_critical(),
            early_start_date: offset_date(as_of, timing.early_start),
            early_finish_date: offset_date(as_of, timing.early_finish),
            late_start_date: offset_date(as_of, timing.late_start),
            late_finish_date: offset_date(as_of, timing.late_finish),
        }
    }
}

#[pymethods]
impl TaskMetrics {
    fn __repr__(&self) -> String {
        format!(
            "TaskMetrics(task_id={:?}, es={}, ef={}, ls={}, lf={}, float={})",
            self.task_id,
            self.early_start,
            self.early_finish,
            self.late_start,
            self.late_finish,
            self.total_float
        )
    }
}

/// Critical path of a project: the zero-float tasks and the overall duration.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathAnalysis {
    #[pyo3(get)]
    pub project_id: String,
    /// Critical tasks only, in topological order.
    #[pyo3(get)]
    pub critical_path: Vec<TaskMetrics>,
    #[pyo3(get)]
    pub project_duration: i64,
    #[pyo3(get)]
    pub analysis_date: NaiveDate,
}

#[pymethods]
impl CriticalPathAnalysis {
    fn __repr__(&self) -> String {
        format!(
            "CriticalPathAnalysis(project_id={:?}, critical_tasks={}, project_duration={})",
            self.project_id,
            self.critical_path.len(),
            self.project_duration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_timing_critical() {
        let timing = TaskTiming {
            early_start: 0,
            early_finish: 5,
            late_start: 0,
            late_finish: 5,
            total_float: 0,
        };
        assert!(timing.is_critical());

        let timing_with_float = TaskTiming {
            early_start: 0,
            early_finish: 5,
            late_start: 2,
            late_finish: 7,
            total_float: 2,
        };
        assert!(!timing_with_float.is_critical());
    }

    #[test]
    fn test_offset_date() {
        let anchor = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        assert_eq!(
            offset_date(anchor, 3),
            NaiveDate::from_ymd_opt(2025, 2, 2).unwrap()
        );
        assert_eq!(
            offset_date(anchor, -30),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert_eq!(offset_date(anchor, 0), anchor);
        assert_eq!(offset_date(anchor, i64::MAX), NaiveDate::MAX);
    }

    #[test]
    fn test_metrics_serialize_field_names() {
        let anchor = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let timing = TaskTiming {
            early_start: 2,
            early_finish: 5,
            late_start: 2,
            late_finish: 5,
            total_float: 0,
        };
        let metrics = TaskMetrics::from_timing("a", "Design", 3, &timing, anchor);
        let value = serde_json::to_value(&metrics).unwrap();

        for key in [
            "taskId",
            "taskName",
            "duration",
            "earlyStart",
            "earlyFinish",
            "lateStart",
            "lateFinish",
            "totalFloat",
            "isCritical",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["earlyStartDate"], "2025-01-03");
        assert_eq!(value["lateFinishDate"], "2025-01-06");
        assert_eq!(value["isCritical"], true);
    }
}
