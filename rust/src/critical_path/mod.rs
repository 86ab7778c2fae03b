//! Critical Path Method analysis over a project's task graph.
//!
//! Computes early/late start and finish, total float and the set of
//! zero-float tasks that determine the project duration.

mod calculation;
mod types;

pub use calculation::{analyze_critical_path, calculate_critical_path, CriticalPathResult};
pub use types::{CriticalPathAnalysis, CriticalPathError, TaskMetrics, TaskTiming};
