//! Slot mapping between two connected phases.
//!
//! Generates the default exit-slot → incoming-slot assignment when a new
//! connection is made, applies mapping presets, and answers which slots are
//! locked by rules belonging to other connections. Manual rewiring lives in
//! [`selection`].

pub mod selection;

use crate::graph::PhaseGraph;
use crate::types::{AdvancementRule, ExitSlot, Phase, PhaseType};

pub use selection::{RewireOutcome, RewireSession, Selection};

/// Error type for mapping operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapperError {
    /// Referenced phase does not exist.
    #[error("phase not found: {0}")]
    PhaseNotFound(String),
    /// Cross-pool mapping needs a Pools source with at least two pools.
    #[error("cross-pool mapping requires a Pools source with >= 2 pools, got \"{source_phase}\"")]
    CrossPoolUnavailable {
        /// The offending source phase.
        source_phase: String,
    },
}

/// Mapping presets a director can apply to one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingPreset {
    /// Recompute the default mapping, discarding custom wiring.
    Default,
    /// Snake rank-1 finishers across pools before rank-2 (pool sources only).
    CrossPool,
}

/// Compute the default mapping for a new `source → target` connection.
///
/// The returned rules are not installed; see [`connect`].
pub fn default_mapping(
    graph: &PhaseGraph,
    source: &str,
    target: &str,
) -> Result<Vec<AdvancementRule>, MapperError> {
    let (src, tgt) = endpoints(graph, source, target)?;
    let n = src.advancing_slot_count.min(tgt.incoming_slot_count);

    if src.phase_type == PhaseType::Pools && src.pool_count > 1 {
        return Ok(pool_major_mapping(src, tgt, n));
    }

    if src.exposes_loser_exits() && src.match_count() > 0 {
        return Ok(bracket_round_mapping(graph, src, tgt, n));
    }

    Ok(sequential_mapping(src, tgt, n))
}

/// Sequential 1:1 — finish position i feeds incoming slot i.
fn sequential_mapping(src: &Phase, tgt: &Phase, n: u32) -> Vec<AdvancementRule> {
    // Pool phases keep pool-form exit slots even with a single pool.
    let pool = (src.phase_type == PhaseType::Pools).then_some(0);
    (1..=n)
        .map(|i| AdvancementRule {
            source_phase: src.name.clone(),
            target_phase: tgt.name.clone(),
            finish_position: i,
            target_slot_number: i,
            source_pool_index: pool,
        })
        .collect()
}

/// Pool-major, rank-minor: pool0-rank1→1, pool0-rank2→2, pool1-rank1→3, …
fn pool_major_mapping(src: &Phase, tgt: &Phase, n: u32) -> Vec<AdvancementRule> {
    let adv_per_pool = (n / src.pool_count).max(1);
    let mut rules = Vec::new();
    let mut slot = 1;
    for pool in 0..src.pool_count {
        for rank in 1..=adv_per_pool {
            rules.push(AdvancementRule::from_pool(&src.name, &tgt.name, pool, rank, slot));
            slot += 1;
        }
    }
    rules
}

/// Winners to one target, losers to another, in whichever order the
/// director connects them. Both already routed elsewhere falls back to the
/// full sequential range.
fn bracket_round_mapping(
    graph: &PhaseGraph,
    src: &Phase,
    tgt: &Phase,
    n: u32,
) -> Vec<AdvancementRule> {
    let matches = src.match_count();
    let elsewhere: Vec<u32> = graph
        .rules_from(&src.name)
        .filter(|r| r.target_phase != tgt.name)
        .map(|r| r.finish_position)
        .collect();
    let winners_mapped = (1..=matches).all(|i| elsewhere.contains(&i));
    let losers_mapped = (matches + 1..=matches * 2).all(|i| elsewhere.contains(&i));

    let count = matches.min(tgt.incoming_slot_count);
    if !winners_mapped {
        (1..=count)
            .map(|i| AdvancementRule::new(&src.name, &tgt.name, i, i))
            .collect()
    } else if !losers_mapped {
        (1..=count)
            .map(|i| AdvancementRule::new(&src.name, &tgt.name, matches + i, i))
            .collect()
    } else {
        (1..=n)
            .map(|i| AdvancementRule::new(&src.name, &tgt.name, i, i))
            .collect()
    }
}

/// Cross-pool snake: for each rank, visit pools forward on odd ranks and in
/// reverse on even ranks, assigning increasing incoming slots. Spreads rank-1
/// finishers across the draw before any rank-2 finisher appears.
pub fn cross_pool_mapping(
    graph: &PhaseGraph,
    source: &str,
    target: &str,
) -> Result<Vec<AdvancementRule>, MapperError> {
    let (src, tgt) = endpoints(graph, source, target)?;
    if src.phase_type != PhaseType::Pools || src.pool_count < 2 {
        return Err(MapperError::CrossPoolUnavailable {
            source_phase: source.to_string(),
        });
    }

    let n = src.advancing_slot_count.min(tgt.incoming_slot_count);
    let adv_per_pool = (n / src.pool_count).max(1);
    let mut rules = Vec::new();
    let mut slot = 1;
    for rank in 1..=adv_per_pool {
        let forward = rank % 2 == 1;
        let pools: Vec<u32> = if forward {
            (0..src.pool_count).collect()
        } else {
            (0..src.pool_count).rev().collect()
        };
        for pool in pools {
            rules.push(AdvancementRule::from_pool(source, target, pool, rank, slot));
            slot += 1;
        }
    }
    Ok(rules)
}

/// Create a new connection with its default mapping installed.
pub fn connect(graph: &mut PhaseGraph, source: &str, target: &str) -> Result<usize, MapperError> {
    let rules = default_mapping(graph, source, target)?;
    let count = rules.len();
    for rule in rules {
        graph.add_or_update_rule(rule);
    }
    Ok(count)
}

/// Apply a preset to one connection, discarding its prior mappings only.
pub fn apply_preset(
    graph: &mut PhaseGraph,
    source: &str,
    target: &str,
    preset: MappingPreset,
) -> Result<usize, MapperError> {
    let rules = match preset {
        MappingPreset::Default => default_mapping(graph, source, target)?,
        MappingPreset::CrossPool => cross_pool_mapping(graph, source, target)?,
    };
    graph.remove_rules(|r| r.connects(source, target));
    let count = rules.len();
    for rule in rules {
        graph.add_or_update_rule(rule);
    }
    Ok(count)
}

/// Whether an exit slot is locked: consumed by a rule from `source` that
/// belongs to a different connection.
pub fn exit_slot_locked(graph: &PhaseGraph, source: &str, target: &str, slot: ExitSlot) -> bool {
    graph
        .rules_from(source)
        .any(|r| r.target_phase != target && r.exit_slot() == slot)
}

/// Whether an incoming slot is locked: claimed by a rule into `target` that
/// belongs to a different connection.
pub fn incoming_slot_locked(graph: &PhaseGraph, source: &str, target: &str, slot: u32) -> bool {
    graph
        .rules_into(target)
        .any(|r| r.source_phase != source && r.target_slot_number == slot)
}

fn endpoints<'a>(
    graph: &'a PhaseGraph,
    source: &str,
    target: &str,
) -> Result<(&'a Phase, &'a Phase), MapperError> {
    let src = graph
        .phase(source)
        .ok_or_else(|| MapperError::PhaseNotFound(source.to_string()))?;
    let tgt = graph
        .phase(target)
        .ok_or_else(|| MapperError::PhaseNotFound(target.to_string()))?;
    Ok((src, tgt))
}
