//! Topological resequencing of phase sort orders.
//!
//! Kahn's algorithm over the de-duplicated `(source → target)` phase pairs
//! derived from the rule set. Among ready phases the one highest on the
//! canvas (smallest `position.y`, ties by insertion order) is scheduled
//! next, so the computed order respects the visual top-to-bottom intent.

use std::collections::BTreeSet;

use crate::graph::PhaseGraph;

/// Error type for resequencing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// The rule graph contains a cycle; no schedule exists.
    #[error("advancement rules form a cycle involving: {}", phases.join(", "))]
    CycleDetected {
        /// Phases that never reached in-degree zero.
        phases: Vec<String>,
    },
}

/// Recompute every phase's `sort_order` from the rule graph.
///
/// Orders are staged and applied only on success: a cycle leaves every
/// `sort_order` exactly as it was.
pub fn resync(graph: &mut PhaseGraph) -> Result<(), SequenceError> {
    let order = schedule(graph)?;
    for (sort_order, idx) in order.into_iter().enumerate() {
        let name = graph.phases()[idx].name.clone();
        if let Some(phase) = graph.phase_mut(&name) {
            phase.sort_order = sort_order as u32 + 1;
        }
    }
    Ok(())
}

/// Compute the scheduling order as indices into `graph.phases()`.
pub(crate) fn schedule(graph: &PhaseGraph) -> Result<Vec<usize>, SequenceError> {
    let phases = graph.phases();
    let n = phases.len();

    // De-duplicated edges as index pairs.
    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    for rule in graph.rules() {
        let source = phases.iter().position(|p| p.name == rule.source_phase);
        let target = phases.iter().position(|p| p.name == rule.target_phase);
        if let (Some(s), Some(t)) = (source, target) {
            if s != t {
                edges.insert((s, t));
            }
        }
    }

    let mut in_degree = vec![0usize; n];
    for &(_, t) in &edges {
        in_degree[t] += 1;
    }

    let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while !ready.is_empty() {
        // Smallest y wins; `ready` is kept in insertion order and the scan
        // keeps the first minimum, so ties break toward the earlier phase.
        let mut pick = 0;
        for i in 1..ready.len() {
            if phases[ready[i]].position.y < phases[ready[pick]].position.y {
                pick = i;
            }
        }
        let next = ready.remove(pick);
        order.push(next);

        for &(s, t) in &edges {
            if s == next {
                in_degree[t] -= 1;
                if in_degree[t] == 0 {
                    ready.push(t);
                }
            }
        }
    }

    if order.len() < n {
        let scheduled: BTreeSet<usize> = order.iter().copied().collect();
        let phases: Vec<String> = (0..n)
            .filter(|i| !scheduled.contains(i))
            .map(|i| graph.phases()[i].name.clone())
            .collect();
        return Err(SequenceError::CycleDetected { phases });
    }

    Ok(order)
}
