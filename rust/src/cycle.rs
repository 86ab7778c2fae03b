//! Cycle check for candidate dependencies.
//!
//! Runs entirely on the already-loaded edge set; nothing is written to the
//! store to perform the check.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::Dependency;

/// Return true if adding `candidate` to `existing` would close a directed cycle.
pub fn would_create_cycle(existing: &[Dependency], candidate: &Dependency) -> bool {
    cycle_path(existing, candidate).is_some()
}

/// Find the cycle that `candidate` would close, if any.
///
/// Depth-first search from the candidate's predecessor over
/// `existing ∪ {candidate}`, tracking the current path. Reaching a task that is
/// still on the path is a back edge. The returned path starts and ends at
/// the repeated task. Self-loops return immediately.
pub fn cycle_path(existing: &[Dependency], candidate: &Dependency) -> Option<Vec<String>> {
    if candidate.is_self_loop() {
        return Some(vec![
            candidate.predecessor_id.clone(),
            candidate.successor_id.clone(),
        ]);
    }

    let mut adjacency: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for dep in existing.iter().chain(std::iter::once(candidate)) {
        adjacency
            .entry(dep.predecessor_id.as_str())
            .or_default()
            .push(dep.successor_id.as_str());
    }

    let start = candidate.predecessor_id.as_str();
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut on_path: FxHashSet<&str> = FxHashSet::default();
    // (task, index of the next successor to explore)
    let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
    visited.insert(start);
    on_path.insert(start);

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;
        let successors = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);

        let Some(&succ) = successors.get(next) else {
            on_path.remove(node);
            stack.pop();
            continue;
        };
        frame.1 += 1;

        if on_path.contains(succ) {
            let from = stack.iter().position(|(id, _)| *id == succ).unwrap_or(0);
            let mut path: Vec<String> = stack[from..].iter().map(|(id, _)| id.to_string()).collect();
            path.push(succ.to_string());
            return Some(path);
        }
        if visited.insert(succ) {
            on_path.insert(succ);
            stack.push((succ, 0));
        }
    }

    None
}
