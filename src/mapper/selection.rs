//! Manual rewiring of one connection.
//!
//! A rewire session edits the rules of a single `source → target` pair
//! through a two-state machine: `Idle`, or `SourceSelected` with a pending
//! exit slot. Every committed change is applied to the graph atomically;
//! anything that logically cancels the pending selection clears it.

use crate::graph::PhaseGraph;
use crate::types::{AdvancementRule, ExitSlot};

use super::{exit_slot_locked, incoming_slot_locked};

/// Pending-selection state of a rewire session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    Idle,
    /// An exit slot is selected and awaits an incoming slot.
    SourceSelected(ExitSlot),
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewireOutcome {
    /// An exit slot became the pending selection.
    Selected(ExitSlot),
    /// The pending selection was cleared.
    Deselected,
    /// A mapping was committed to the graph.
    Committed(AdvancementRule),
    /// A single mapping was removed from the graph.
    Removed,
    /// The click hit a locked or inapplicable slot; nothing changed.
    Ignored,
}

/// Interactive editor for the rules of one phase-to-phase connection.
#[derive(Debug, Clone)]
pub struct RewireSession {
    source: String,
    target: String,
    state: Selection,
}

impl RewireSession {
    /// Open a session on the `source → target` connection.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            state: Selection::Idle,
        }
    }

    /// Current selection state.
    pub fn state(&self) -> Selection {
        self.state
    }

    /// The connection's source phase.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The connection's target phase.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Handle a click on an exit slot of the source phase.
    ///
    /// An unclaimed slot becomes the selection; clicking the selected slot
    /// again deselects it. Slots consumed by another connection, or already
    /// wired within this one, are not selectable.
    pub fn click_exit_slot(&mut self, graph: &PhaseGraph, slot: ExitSlot) -> RewireOutcome {
        if self.state == Selection::SourceSelected(slot) {
            self.state = Selection::Idle;
            return RewireOutcome::Deselected;
        }
        if exit_slot_locked(graph, &self.source, &self.target, slot)
            || self.claimed_here(graph, slot)
        {
            return RewireOutcome::Ignored;
        }
        self.state = Selection::SourceSelected(slot);
        RewireOutcome::Selected(slot)
    }

    /// Handle a click on an incoming slot of the target phase.
    ///
    /// While a source is selected, a slot not claimed by a different
    /// connection commits the mapping; any prior rule of this connection at
    /// the same incoming slot is replaced. A target slot accepts one source.
    pub fn click_incoming_slot(&mut self, graph: &mut PhaseGraph, slot: u32) -> RewireOutcome {
        let Selection::SourceSelected(exit) = self.state else {
            return RewireOutcome::Ignored;
        };
        if incoming_slot_locked(graph, &self.source, &self.target, slot) {
            return RewireOutcome::Ignored;
        }
        let rule = AdvancementRule {
            source_phase: self.source.clone(),
            target_phase: self.target.clone(),
            finish_position: exit.rank,
            target_slot_number: slot,
            source_pool_index: exit.pool,
        };
        graph.add_or_update_rule(rule.clone());
        self.state = Selection::Idle;
        RewireOutcome::Committed(rule)
    }

    /// Handle a click on an existing connection line: removes that mapping.
    pub fn click_rule(&mut self, graph: &mut PhaseGraph, slot: ExitSlot) -> RewireOutcome {
        let removed = graph.remove_rules(|r| {
            r.connects(&self.source, &self.target) && r.exit_slot() == slot
        });
        if removed > 0 {
            RewireOutcome::Removed
        } else {
            RewireOutcome::Ignored
        }
    }

    /// Clear the pending selection (panel closed, other connection chosen).
    pub fn cancel(&mut self) {
        self.state = Selection::Idle;
    }

    fn claimed_here(&self, graph: &PhaseGraph, slot: ExitSlot) -> bool {
        graph
            .rules_between(&self.source, &self.target)
            .any(|r| r.exit_slot() == slot)
    }
}
