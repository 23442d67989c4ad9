//! Advancement rules: the edges of the phase graph.

use serde::{Deserialize, Serialize};
use super::slot::ExitSlot;

/// A mapping from one phase's exit slot to another phase's incoming slot.
///
/// Phases are referenced by name (the canonical key). Implements `Ord` for
/// canonical ordering: (source, pool, finish, target, slot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancementRule {
    /// Name of the phase the finisher exits.
    pub source_phase: String,
    /// Name of the phase the finisher enters.
    pub target_phase: String,
    /// Rank of the exit slot within its source (1-based; within the pool
    /// for pool phases).
    pub finish_position: u32,
    /// Incoming-slot index at the target (1-based).
    pub target_slot_number: u32,
    /// Which pool the exit slot belongs to; `None` for non-pool sources.
    #[serde(default)]
    pub source_pool_index: Option<u32>,
}

impl AdvancementRule {
    /// Create a rule from a non-pool source.
    pub fn new(
        source_phase: impl Into<String>,
        target_phase: impl Into<String>,
        finish_position: u32,
        target_slot_number: u32,
    ) -> Self {
        Self {
            source_phase: source_phase.into(),
            target_phase: target_phase.into(),
            finish_position,
            target_slot_number,
            source_pool_index: None,
        }
    }

    /// Create a rule from a pool source.
    pub fn from_pool(
        source_phase: impl Into<String>,
        target_phase: impl Into<String>,
        pool: u32,
        finish_position: u32,
        target_slot_number: u32,
    ) -> Self {
        Self {
            source_phase: source_phase.into(),
            target_phase: target_phase.into(),
            finish_position,
            target_slot_number,
            source_pool_index: Some(pool),
        }
    }

    /// Whether this rule references `name` as source or target.
    pub fn references(&self, name: &str) -> bool {
        self.source_phase == name || self.target_phase == name
    }

    /// Whether this rule belongs to the `source → target` connection.
    pub fn connects(&self, source: &str, target: &str) -> bool {
        self.source_phase == source && self.target_phase == target
    }

    /// The exit slot this rule consumes.
    pub fn exit_slot(&self) -> ExitSlot {
        ExitSlot::new(self.source_pool_index, self.finish_position)
    }
}

// Canonical ordering: source, then pool, then finish, then target, then slot.
impl PartialOrd for AdvancementRule {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AdvancementRule {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (
            &self.source_phase,
            self.source_pool_index,
            self.finish_position,
            &self.target_phase,
            self.target_slot_number,
        )
            .cmp(&(
                &other.source_phase,
                other.source_pool_index,
                other.finish_position,
                &other.target_phase,
                other.target_slot_number,
            ))
    }
}
