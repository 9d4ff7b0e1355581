//! Composite ranking and prerequisite-respecting sequencing.
//!
//! Candidates are sorted by [`Recommendation::composite_score`] and then
//! walked depth-first, emitting every candidate prerequisite before its
//! dependent. The result is a topological order in which mutually
//! unconstrained points still appear by descending composite score.
//!
//! The walk uses an explicit stack so deep or malformed graphs cannot blow
//! the call stack. A cyclic graph terminates (the visited set sees to that)
//! but the resulting order depends on traversal order and is not a contract.

use std::collections::HashMap;

use crate::graph::GraphSnapshot;
use crate::model::Recommendation;

/// Hard cap on the number of recommendations returned by one call.
pub const MAX_RECOMMENDATIONS: usize = 50;

enum Visit {
    Enter(usize),
    Emit(usize),
}

/// Order scored candidates and truncate to `limit` (never above
/// [`MAX_RECOMMENDATIONS`]).
///
/// Prerequisite ids that are not candidates (completed, or unknown to the
/// graph) are skipped silently.
pub fn sequence(
    mut candidates: Vec<Recommendation>,
    graph: &GraphSnapshot,
    limit: usize,
) -> Vec<Recommendation> {
    let limit = limit.min(MAX_RECOMMENDATIONS);
    if limit == 0 {
        return Vec::new();
    }

    // Stable: equal scores keep graph order.
    candidates.sort_by(|a, b| b.composite_score().total_cmp(&a.composite_score()));

    let slots: HashMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(slot, rec)| (rec.point_id.as_str(), slot))
        .collect();

    let mut visited = vec![false; candidates.len()];
    let mut order: Vec<usize> = Vec::with_capacity(limit.min(candidates.len()));
    let mut stack: Vec<Visit> = Vec::new();

    'walk: for root in 0..candidates.len() {
        if visited[root] {
            continue;
        }
        stack.push(Visit::Enter(root));

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(slot) => {
                    if visited[slot] {
                        continue;
                    }
                    visited[slot] = true;
                    stack.push(Visit::Emit(slot));

                    let Some(point) = graph.get(&candidates[slot].point_id) else {
                        continue;
                    };
                    // Reversed so the first declared prerequisite is visited first.
                    for prereq in point.prerequisites.iter().rev() {
                        match slots.get(prereq.as_str()) {
                            Some(&dep) if !visited[dep] => stack.push(Visit::Enter(dep)),
                            _ => {}
                        }
                    }
                }
                Visit::Emit(slot) => {
                    order.push(slot);
                    if order.len() == limit {
                        break 'walk;
                    }
                }
            }
        }
    }

    drop(slots);
    let mut taken: Vec<Option<Recommendation>> = candidates.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|slot| taken[slot].take())
        .collect()
}
