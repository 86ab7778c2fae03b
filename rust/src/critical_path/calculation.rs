//! Critical path calculation using forward and backward passes.

use chrono::NaiveDate;

use crate::config::{SchedulerConfig, TerminalAnchor};
use crate::graph::{TaskGraph, TaskIndex};
use crate::log_debug;
use crate::models::{Dependency, DependencyType};

use super::types::{CriticalPathAnalysis, CriticalPathError, TaskMetrics, TaskTiming};

/// Result of the CPM passes over a whole task graph.
#[derive(Clone, Debug, Default)]
pub struct CriticalPathResult {
    /// Timing per task, indexed by `TaskIndex`.
    pub timings: Vec<TaskTiming>,
    /// Scheduling duration per task, indexed by `TaskIndex`.
    pub durations: Vec<i64>,
    /// Tasks in the order the forward pass visited them.
    pub order: Vec<TaskIndex>,
    /// Max early finish over all tasks (0 for an empty graph).
    pub project_duration: i64,
}

impl CriticalPathResult {
    /// Metrics for every task, critical or not, in topological order.
    pub fn metrics(&self, graph: &TaskGraph, as_of: NaiveDate) -> Vec<TaskMetrics> {
        self.order
            .iter()
            .map(|&idx| self.metrics_at(graph, idx, as_of))
            .collect()
    }

    /// Metrics for zero-float tasks only, in topological order.
    pub fn critical_metrics(&self, graph: &TaskGraph, as_of: NaiveDate) -> Vec<TaskMetrics> {
        self.order
            .iter()
            .filter(|&&idx| self.timings[idx].is_critical())
            .map(|&idx| self.metrics_at(graph, idx, as_of))
            .collect()
    }

    /// Timing for a task id, if it is in the graph.
    pub fn timing(&self, graph: &TaskGraph, task_id: &str) -> Option<TaskTiming> {
        graph.index_of(task_id).map(|idx| self.timings[idx])
    }

    fn metrics_at(&self, graph: &TaskGraph, idx: TaskIndex, as_of: NaiveDate) -> TaskMetrics {
        let task = graph.task_at(idx);
        TaskMetrics::from_timing(
            &task.id,
            &task.name,
            self.durations[idx],
            &self.timings[idx],
            as_of,
        )
    }
}

/// Lower bound a dependency puts on its successor's early start.
fn successor_start_bound(
    dep: &Dependency,
    pred: &TaskTiming,
    succ_duration: i64,
    honor_types: bool,
) -> i64 {
    if !honor_types {
        return pred.early_finish;
    }
    match dep.dependency_type {
        DependencyType::FinishToStart | DependencyType::Unrecognized => {
            pred.early_finish.saturating_add(dep.lag)
        }
        DependencyType::StartToStart => pred.early_start.saturating_add(dep.lag),
        DependencyType::FinishToFinish => pred
            .early_finish
            .saturating_add(dep.lag)
            .saturating_sub(succ_duration),
        DependencyType::StartToFinish => pred
            .early_start
            .saturating_add(dep.lag)
            .saturating_sub(succ_duration),
    }
}

/// Upper bound a dependency puts on its predecessor's late finish.
fn predecessor_finish_bound(
    dep: &Dependency,
    succ: &TaskTiming,
    pred_duration: i64,
    honor_types: bool,
) -> i64 {
    if !honor_types {
        return succ.late_start;
    }
    match dep.dependency_type {
        DependencyType::FinishToStart | DependencyType::Unrecognized => {
            succ.late_start.saturating_sub(dep.lag)
        }
        DependencyType::StartToStart => succ
            .late_start
            .saturating_sub(dep.lag)
            .saturating_add(pred_duration),
        DependencyType::FinishToFinish => succ.late_finish.saturating_sub(dep.lag),
        DependencyType::StartToFinish => succ
            .late_finish
            .saturating_sub(dep.lag)
            .saturating_add(pred_duration),
    }
}

/// Run the forward and backward passes over every task in the graph.
///
/// Day arithmetic saturates at the `i64` range, so extreme durations or lags
/// clamp instead of wrapping.
///
/// Forward: a task starts at the latest bound imposed by its predecessors
/// (never before day 0). Backward: a task finishes by the earliest bound
/// imposed by its successors, capped at the project duration; tasks without
/// successors are anchored per `config.terminal_anchor`.
///
/// # Returns
/// * `Err(CriticalPathError::CircularDependency)` if the edges contain a cycle
pub fn calculate_critical_path(
    graph: &TaskGraph,
    config: &SchedulerConfig,
) -> Result<CriticalPathResult, CriticalPathError> {
    let order = graph
        .topological_order()
        .map_err(|_| CriticalPathError::CircularDependency)?;

    let n = graph.len();
    let honor_types = config.honor_dependency_types;
    let durations: Vec<i64> = graph
        .tasks()
        .iter()
        .map(|t| t.duration_days(config.default_duration_days))
        .collect();
    let mut timings = vec![TaskTiming::default(); n];

    // Forward pass
    for &idx in &order {
        let duration = durations[idx];
        let early_start = graph
            .incoming(idx)
            .map(|(pred, dep)| successor_start_bound(dep, &timings[pred], duration, honor_types))
            .fold(0, i64::max);

        let timing = &mut timings[idx];
        timing.early_start = early_start;
        timing.early_finish = early_start.saturating_add(duration);
        log_debug!(
            config.verbosity,
            task = %graph.task_at(idx).id,
            early_start,
            early_finish = timing.early_finish,
            "forward pass"
        );
    }

    let project_duration = timings.iter().map(|t| t.early_finish).max().unwrap_or(0);

    // Backward pass
    for &idx in order.iter().rev() {
        let duration = durations[idx];
        let bound = graph
            .outgoing(idx)
            .map(|(succ, dep)| predecessor_finish_bound(dep, &timings[succ], duration, honor_types))
            .min();

        // No task may finish after the project does, even when a start-based
        // successor bound would allow it.
        let late_finish = match bound {
            Some(bound) => bound.min(project_duration),
            None => match config.terminal_anchor {
                TerminalAnchor::OwnEarlyFinish => timings[idx].early_finish,
                TerminalAnchor::ProjectDuration => project_duration,
            },
        };

        let timing = &mut timings[idx];
        timing.late_finish = late_finish;
        timing.late_start = late_finish.saturating_sub(duration);
        timing.total_float = timing.late_start.saturating_sub(timing.early_start);
        log_debug!(
            config.verbosity,
            task = %graph.task_at(idx).id,
            late_start = timing.late_start,
            late_finish,
            total_float = timing.total_float,
            "backward pass"
        );
    }

    Ok(CriticalPathResult {
        timings,
        durations,
        order,
        project_duration,
    })
}

/// Compute the critical path analysis for one project's graph.
///
/// Offsets are rendered as dates relative to `as_of`.
pub fn analyze_critical_path(
    project_id: &str,
    graph: &TaskGraph,
    config: &SchedulerConfig,
    as_of: NaiveDate,
) -> Result<CriticalPathAnalysis, CriticalPathError> {
    let result = calculate_critical_path(graph, config)?;
    Ok(CriticalPathAnalysis {
        project_id: project_id.to_string(),
        critical_path: result.critical_metrics(graph, as_of),
        project_duration: result.project_duration,
        analysis_date: as_of,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn make_task(id: &str, duration: i64) -> Task {
        Task::new(id, "p1", id.to_uppercase(), Some(duration))
    }

    fn make_dep(pred: &str, succ: &str, kind: DependencyType, lag: i64) -> Dependency {
        Dependency::new(format!("{}-{}", pred, succ), "p1", pred, succ, kind, lag)
    }

    fn fs(pred: &str, succ: &str) -> Dependency {
        make_dep(pred, succ, DependencyType::FinishToStart, 0)
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn timing(result: &CriticalPathResult, graph: &TaskGraph, id: &str) -> TaskTiming {
        result.timing(graph, id).unwrap()
    }

    #[test]
    fn test_single_task_critical_path() {
        let graph = TaskGraph::new(vec![make_task("a", 5)], vec![]).unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default()).unwrap();

        assert_eq!(result.project_duration, 5);
        let a = timing(&result, &graph, "a");
        assert_eq!((a.early_start, a.early_finish), (0, 5));
        assert_eq!((a.late_start, a.late_finish), (0, 5));
        assert!(a.is_critical());
    }

    #[test]
    fn test_chain_critical_path() {
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 3), make_task("c", 4)],
            vec![fs("a", "b"), fs("b", "c")],
        )
        .unwrap();
        let analysis =
            analyze_critical_path("p1", &graph, &SchedulerConfig::default(), as_of()).unwrap();

        assert_eq!(analysis.project_duration, 12);
        assert_eq!(analysis.analysis_date, as_of());
        let spans: Vec<(&str, i64, i64, i64)> = analysis
            .critical_path
            .iter()
            .map(|m| {
                (
                    m.task_id.as_str(),
                    m.early_start,
                    m.early_finish,
                    m.total_float,
                )
            })
            .collect();
        assert_eq!(
            spans,
            vec![("a", 0, 5, 0), ("b", 5, 8, 0), ("c", 8, 12, 0)]
        );
        assert!(analysis.critical_path.iter().all(|m| m.is_critical));
        assert_eq!(
            analysis.critical_path[2].early_finish_date,
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap()
        );
    }

    #[test]
    fn test_parallel_paths_with_float() {
        // a -> b (short), a -> c (long); both terminal
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 2), make_task("c", 6)],
            vec![fs("a", "b"), fs("a", "c")],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default()).unwrap();

        assert_eq!(result.project_duration, 11);
        let b = timing(&result, &graph, "b");
        let c = timing(&result, &graph, "c");
        assert_eq!(b.total_float, 4);
        assert!(!b.is_critical());
        assert_eq!(c.total_float, 0);
        assert!(c.is_critical());
        assert!(timing(&result, &graph, "a").is_critical());

        let analysis =
            analyze_critical_path("p1", &graph, &SchedulerConfig::default(), as_of()).unwrap();
        let ids: Vec<&str> = analysis
            .critical_path
            .iter()
            .map(|m| m.task_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_terminal_anchor_own_early_finish() {
        // Same graph, compatibility anchor: b's late finish is its own early finish
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 2), make_task("c", 6)],
            vec![fs("a", "b"), fs("a", "c")],
        )
        .unwrap();
        let config = SchedulerConfig {
            terminal_anchor: TerminalAnchor::OwnEarlyFinish,
            ..SchedulerConfig::default()
        };
        let result = calculate_critical_path(&graph, &config).unwrap();

        let b = timing(&result, &graph, "b");
        assert_eq!((b.late_start, b.late_finish), (5, 7));
        assert_eq!(b.total_float, 0);
        assert_eq!(result.project_duration, 11);
    }

    #[test]
    fn test_diamond_dependency() {
        // a -> b -> d, a -> c -> d; c is the long branch
        let graph = TaskGraph::new(
            vec![
                make_task("a", 2),
                make_task("b", 3),
                make_task("c", 5),
                make_task("d", 4),
            ],
            vec![fs("a", "b"), fs("a", "c"), fs("b", "d"), fs("c", "d")],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default()).unwrap();

        assert_eq!(result.project_duration, 11);
        let d = timing(&result, &graph, "d");
        assert_eq!(d.early_start, 7); // max(b.ef = 5, c.ef = 7)
        let b = timing(&result, &graph, "b");
        assert_eq!(b.late_finish, 7);
        assert_eq!(b.total_float, 2);
        let a = timing(&result, &graph, "a");
        assert_eq!(a.late_finish, 2); // min(b.ls = 4, c.ls = 2)
        assert!(a.is_critical());
    }

    #[test]
    fn test_empty_graph() {
        let graph = TaskGraph::new(vec![], vec![]).unwrap();
        let analysis =
            analyze_critical_path("p1", &graph, &SchedulerConfig::default(), as_of()).unwrap();
        assert_eq!(analysis.project_duration, 0);
        assert!(analysis.critical_path.is_empty());
    }

    #[test]
    fn test_unset_duration_counts_as_one_day() {
        let graph = TaskGraph::new(
            vec![
                Task::new("a", "p1", "A", None),
                Task::new("b", "p1", "B", Some(0)),
            ],
            vec![fs("a", "b")],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default()).unwrap();
        assert_eq!(result.project_duration, 2);
        assert_eq!(result.durations, vec![1, 1]);
    }

    #[test]
    fn test_type_and_lag_ignored_by_default() {
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 3)],
            vec![make_dep("a", "b", DependencyType::StartToStart, 2)],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default()).unwrap();
        assert_eq!(timing(&result, &graph, "b").early_start, 5);
        assert_eq!(result.project_duration, 8);
    }

    fn honoring() -> SchedulerConfig {
        SchedulerConfig {
            honor_dependency_types: true,
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn test_finish_to_start_with_lag_and_lead() {
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 3), make_task("c", 2)],
            vec![
                make_dep("a", "b", DependencyType::FinishToStart, 2),
                make_dep("b", "c", DependencyType::FinishToStart, -1),
            ],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &honoring()).unwrap();

        assert_eq!(timing(&result, &graph, "b").early_start, 7);
        assert_eq!(timing(&result, &graph, "c").early_start, 9);
        assert_eq!(result.project_duration, 11);
        assert!(result.timings.iter().all(TaskTiming::is_critical));
    }

    #[test]
    fn test_start_to_start() {
        // b may start 1 day after a starts; a is the long task
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 3)],
            vec![make_dep("a", "b", DependencyType::StartToStart, 1)],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &honoring()).unwrap();

        let b = timing(&result, &graph, "b");
        assert_eq!((b.early_start, b.early_finish), (1, 4));
        assert_eq!(result.project_duration, 5);
        assert_eq!(b.total_float, 1);
        let a = timing(&result, &graph, "a");
        // The SS edge alone would let a finish at 6; the project end caps it at 5
        assert_eq!(a.late_finish, 5);
        assert!(a.is_critical());
    }

    #[test]
    fn test_finish_to_finish() {
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 2)],
            vec![make_dep("a", "b", DependencyType::FinishToFinish, 0)],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &honoring()).unwrap();

        let b = timing(&result, &graph, "b");
        assert_eq!((b.early_start, b.early_finish), (3, 5));
        assert!(b.is_critical());
        assert_eq!(result.project_duration, 5);
    }

    #[test]
    fn test_start_to_finish_clamped_at_zero() {
        // b must finish after a starts + 1; the bound would start b before day 0
        let graph = TaskGraph::new(
            vec![make_task("a", 4), make_task("b", 3)],
            vec![make_dep("a", "b", DependencyType::StartToFinish, 1)],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &honoring()).unwrap();
        let b = timing(&result, &graph, "b");
        assert_eq!((b.early_start, b.early_finish), (0, 3));
        assert_eq!(result.project_duration, 4);
    }

    #[test]
    fn test_unrecognized_type_behaves_as_finish_to_start() {
        let graph = TaskGraph::new(
            vec![make_task("a", 2), make_task("b", 2)],
            vec![make_dep("a", "b", DependencyType::Unrecognized, 1)],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &honoring()).unwrap();
        assert_eq!(timing(&result, &graph, "b").early_start, 3);
    }

    #[test]
    fn test_cycle_is_an_error_not_a_hang() {
        let graph = TaskGraph::new(
            vec![make_task("a", 1), make_task("b", 1)],
            vec![fs("a", "b"), fs("b", "a")],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default());
        assert_eq!(result.unwrap_err(), CriticalPathError::CircularDependency);
    }

    #[test]
    fn test_metrics_include_non_critical_tasks() {
        let graph = TaskGraph::new(
            vec![make_task("a", 5), make_task("b", 2), make_task("c", 6)],
            vec![fs("a", "b"), fs("a", "c")],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default()).unwrap();
        let all = result.metrics(&graph, as_of());
        assert_eq!(all.len(), 3);
        let b = all.iter().find(|m| m.task_id == "b").unwrap();
        assert_eq!(b.late_start_date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert!(!b.is_critical);
    }

    #[test]
    fn test_huge_duration_saturates() {
        let graph = TaskGraph::new(
            vec![
                Task::new("a", "p1", "A", Some(i64::MAX)),
                make_task("b", 1),
            ],
            vec![fs("a", "b")],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &SchedulerConfig::default()).unwrap();

        assert_eq!(result.project_duration, i64::MAX);
        assert_eq!(timing(&result, &graph, "a").early_finish, i64::MAX);
        let b = timing(&result, &graph, "b");
        assert_eq!((b.early_start, b.early_finish), (i64::MAX, i64::MAX));
        assert_eq!(b.late_finish, i64::MAX);

        let analysis = analyze_critical_path("p1", &graph, &SchedulerConfig::default(), as_of());
        assert!(analysis.is_ok());
    }

    #[test]
    fn test_extreme_lags_saturate() {
        let graph = TaskGraph::new(
            vec![make_task("a", 2), make_task("b", 3), make_task("c", 1)],
            vec![
                make_dep("a", "b", DependencyType::FinishToStart, i64::MAX),
                make_dep("a", "c", DependencyType::StartToFinish, i64::MIN),
            ],
        )
        .unwrap();
        let result = calculate_critical_path(&graph, &honoring()).unwrap();

        let b = timing(&result, &graph, "b");
        assert_eq!((b.early_start, b.early_finish), (i64::MAX, i64::MAX));
        // A very negative lag never pulls a task before day 0
        assert_eq!(timing(&result, &graph, "c").early_start, 0);
        assert_eq!(result.project_duration, i64::MAX);
    }
}
