//! Crate-level error type surfaced by the schedule service.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::PyErr;
use thiserror::Error;

use crate::critical_path::CriticalPathError;
use crate::graph::GraphError;
use crate::store::StoreError;

/// Errors returned by scheduler operations.
///
/// Everything except `Store` is a logic error detected before any write and
/// is never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Dependency {predecessor} -> {successor} would create a cycle")]
    CyclicDependency {
        predecessor: String,
        successor: String,
    },
    #[error("Task {task_id} has {count} dependencies and cannot be deleted")]
    HasDependents { task_id: String, count: usize },
    /// Inconsistent graph found during analysis; indicates a bug upstream.
    #[error("Schedule error: {0}")]
    Schedule(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SchedulerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                SchedulerError::NotFound(format!("{} {}", entity, id))
            }
            other => SchedulerError::Store(other),
        }
    }
}

impl From<GraphError> for SchedulerError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::TaskNotFound(id) => SchedulerError::NotFound(format!("Task {}", id)),
            other => SchedulerError::Schedule(other.to_string()),
        }
    }
}

impl From<CriticalPathError> for SchedulerError {
    fn from(err: CriticalPathError) -> Self {
        SchedulerError::Schedule(err.to_string())
    }
}

impl From<SchedulerError> for PyErr {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Store(_) | SchedulerError::Schedule(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}
