//! In-memory phase graph.
//!
//! Phases are stored in insertion order and keyed by `name`; advancement
//! rules reference phases by name only. Structural mutations are atomic:
//! an operation either fully applies or leaves the graph untouched.

use crate::types::{AdvancementRule, Phase};

/// Error type for graph mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A phase with this name already exists.
    #[error("phase name already in use: {0}")]
    DuplicateName(String),
    /// No phase with this name.
    #[error("phase not found: {0}")]
    PhaseNotFound(String),
}

/// The phase/rule graph a template editor session operates on.
///
/// Insertion order of phases is preserved; it is the tiebreak for
/// topological resequencing and the iteration order for fingerprints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseGraph {
    phases: Vec<Phase>,
    rules: Vec<AdvancementRule>,
}

impl PhaseGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a phase. Rejects a name already present.
    pub fn add_phase(&mut self, phase: Phase) -> Result<(), GraphError> {
        if self.contains_phase(&phase.name) {
            return Err(GraphError::DuplicateName(phase.name));
        }
        self.phases.push(phase);
        Ok(())
    }

    /// Remove a phase and cascade: every rule referencing it goes too.
    pub fn remove_phase(&mut self, name: &str) -> Result<Phase, GraphError> {
        let idx = self
            .phases
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| GraphError::PhaseNotFound(name.to_string()))?;
        let removed = self.phases.remove(idx);
        let before = self.rules.len();
        self.rules.retain(|r| !r.references(name));
        let dropped = before - self.rules.len();
        if dropped > 0 {
            tracing::debug!(phase = name, rules = dropped, "cascade-deleted rules");
        }
        Ok(removed)
    }

    /// Rename a phase and rewrite every rule reference, atomically.
    ///
    /// Rejected without mutation when `new` is already used by a different
    /// phase. Renaming a phase to its own name is a no-op.
    pub fn rename_phase(&mut self, old: &str, new: &str) -> Result<(), GraphError> {
        if !self.contains_phase(old) {
            return Err(GraphError::PhaseNotFound(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.contains_phase(new) {
            return Err(GraphError::DuplicateName(new.to_string()));
        }
        for phase in &mut self.phases {
            if phase.name == old {
                phase.name = new.to_string();
            }
        }
        for rule in &mut self.rules {
            if rule.source_phase == old {
                rule.source_phase = new.to_string();
            }
            if rule.target_phase == old {
                rule.target_phase = new.to_string();
            }
        }
        Ok(())
    }

    /// Insert a rule, evicting any rule it conflicts with.
    ///
    /// A target slot accepts at most one source and an exit slot feeds at
    /// most one slot per target, so any existing rule claiming the same
    /// incoming slot `(target, slot)`, or the same exit slot toward the same
    /// target, is replaced. Last writer wins.
    pub fn add_or_update_rule(&mut self, rule: AdvancementRule) {
        self.rules.retain(|r| {
            let same_incoming = r.target_phase == rule.target_phase
                && r.target_slot_number == rule.target_slot_number;
            let same_exit = r.connects(&rule.source_phase, &rule.target_phase)
                && r.exit_slot() == rule.exit_slot();
            !(same_incoming || same_exit)
        });
        self.rules.push(rule);
    }

    /// Push a rule without conflict eviction.
    ///
    /// Used by the parser, which must preserve whatever the stored document
    /// says; the validator reports conflicting claims as warnings.
    pub(crate) fn push_rule_unchecked(&mut self, rule: AdvancementRule) {
        self.rules.push(rule);
    }

    /// Push a phase without the duplicate-name check.
    ///
    /// Parser-only, for the same reason as [`Self::push_rule_unchecked`]:
    /// a stored document may carry duplicates the validator must report.
    pub(crate) fn push_phase_unchecked(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    /// Remove every rule matching `predicate`; returns how many went.
    pub fn remove_rules<F: FnMut(&AdvancementRule) -> bool>(&mut self, mut predicate: F) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| !predicate(r));
        before - self.rules.len()
    }

    /// Whether a phase with this name exists.
    pub fn contains_phase(&self, name: &str) -> bool {
        self.phases.iter().any(|p| p.name == name)
    }

    /// Look up a phase by name.
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Look up a phase mutably by name.
    pub fn phase_mut(&mut self, name: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.name == name)
    }

    /// All phases in insertion order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Phases ordered by current `sort_order` (stable for ties).
    pub fn phases_in_order(&self) -> Vec<&Phase> {
        let mut ordered: Vec<&Phase> = self.phases.iter().collect();
        ordered.sort_by_key(|p| p.sort_order);
        ordered
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> &[AdvancementRule] {
        &self.rules
    }

    /// Rules exiting `source`.
    pub fn rules_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a AdvancementRule> {
        self.rules.iter().filter(move |r| r.source_phase == source)
    }

    /// Rules entering `target`.
    pub fn rules_into<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a AdvancementRule> {
        self.rules.iter().filter(move |r| r.target_phase == target)
    }

    /// Rules belonging to one `source → target` connection.
    pub fn rules_between<'a>(
        &'a self,
        source: &'a str,
        target: &'a str,
    ) -> impl Iterator<Item = &'a AdvancementRule> {
        self.rules.iter().filter(move |r| r.connects(source, target))
    }

    /// Number of phases.
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Number of rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Write a position map onto the phases that appear in it.
    pub fn set_positions<'a, I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = (&'a str, crate::types::Position)>,
    {
        for (name, pos) in positions {
            if let Some(phase) = self.phase_mut(name) {
                phase.position = pos;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PhaseType, Position};

    fn graph_with(names: &[(&str, PhaseType)]) -> PhaseGraph {
        let mut graph = PhaseGraph::new();
        for (name, t) in names {
            graph.add_phase(Phase::new(*name, *t)).unwrap();
        }
        graph
    }

    #[test]
    fn duplicate_phase_name_rejected() {
        let mut graph = graph_with(&[("Pools", PhaseType::Pools)]);
        let err = graph.add_phase(Phase::new("Pools", PhaseType::Swiss)).unwrap_err();
        assert_eq!(err, GraphError::DuplicateName("Pools".to_string()));
        assert_eq!(graph.phase_count(), 1);
    }

    #[test]
    fn remove_phase_cascades_rules() {
        let mut graph = graph_with(&[
            ("QF", PhaseType::BracketRound),
            ("SF", PhaseType::BracketRound),
            ("Final", PhaseType::BracketRound),
        ]);
        graph.add_or_update_rule(AdvancementRule::new("QF", "SF", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("SF", "Final", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("QF", "Final", 2, 2));

        graph.remove_phase("SF").unwrap();

        assert_eq!(graph.phase_count(), 2);
        assert_eq!(graph.rule_count(), 1);
        assert!(graph.rules().iter().all(|r| !r.references("SF")));
    }

    #[test]
    fn rename_rewrites_rule_references() {
        let mut graph = graph_with(&[
            ("QF", PhaseType::BracketRound),
            ("SF", PhaseType::BracketRound),
        ]);
        graph.add_or_update_rule(AdvancementRule::new("QF", "SF", 1, 1));

        graph.rename_phase("QF", "Quarterfinals").unwrap();

        assert!(graph.contains_phase("Quarterfinals"));
        assert!(!graph.contains_phase("QF"));
        assert_eq!(graph.rules()[0].source_phase, "Quarterfinals");
    }

    #[test]
    fn rename_collision_leaves_graph_unchanged() {
        let mut graph = graph_with(&[
            ("QF", PhaseType::BracketRound),
            ("SF", PhaseType::BracketRound),
        ]);
        graph.add_or_update_rule(AdvancementRule::new("QF", "SF", 1, 1));
        let before = graph.clone();

        let err = graph.rename_phase("QF", "SF").unwrap_err();

        assert_eq!(err, GraphError::DuplicateName("SF".to_string()));
        assert_eq!(graph, before);
    }

    #[test]
    fn rename_to_same_name_is_noop() {
        let mut graph = graph_with(&[("QF", PhaseType::BracketRound)]);
        graph.rename_phase("QF", "QF").unwrap();
        assert!(graph.contains_phase("QF"));
    }

    #[test]
    fn rule_upsert_evicts_incoming_slot_claim() {
        let mut graph = graph_with(&[
            ("A", PhaseType::Pools),
            ("B", PhaseType::Pools),
            ("SE", PhaseType::SingleElimination),
        ]);
        graph.add_or_update_rule(AdvancementRule::new("A", "SE", 1, 1));
        // A different source claiming the same incoming slot replaces it.
        graph.add_or_update_rule(AdvancementRule::new("B", "SE", 1, 1));

        assert_eq!(graph.rule_count(), 1);
        assert_eq!(graph.rules()[0].source_phase, "B");
    }

    #[test]
    fn rule_upsert_evicts_exit_slot_claim_same_connection() {
        let mut graph = graph_with(&[
            ("A", PhaseType::Swiss),
            ("SE", PhaseType::SingleElimination),
        ]);
        graph.add_or_update_rule(AdvancementRule::new("A", "SE", 1, 1));
        // Rewiring the same exit slot to a new incoming slot.
        graph.add_or_update_rule(AdvancementRule::new("A", "SE", 1, 3));

        assert_eq!(graph.rule_count(), 1);
        assert_eq!(graph.rules()[0].target_slot_number, 3);
    }

    #[test]
    fn phases_in_order_sorts_by_sort_order() {
        let mut graph = graph_with(&[
            ("Final", PhaseType::BracketRound),
            ("Draw", PhaseType::Draw),
            ("SF", PhaseType::BracketRound),
        ]);
        graph.phase_mut("Final").unwrap().sort_order = 3;
        graph.phase_mut("Draw").unwrap().sort_order = 1;
        graph.phase_mut("SF").unwrap().sort_order = 2;

        let names: Vec<&str> = graph.phases_in_order().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Draw", "SF", "Final"]);
    }

    #[test]
    fn set_positions_skips_unknown_phases() {
        let mut graph = graph_with(&[("Draw", PhaseType::Draw)]);
        graph.set_positions([
            ("Draw", Position::new(10.0, 20.0)),
            ("Ghost", Position::new(1.0, 1.0)),
        ]);
        assert_eq!(graph.phase("Draw").unwrap().position, Position::new(10.0, 20.0));
    }
}
