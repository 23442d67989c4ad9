//! Deterministic layered auto-layout and persisted canvas state.
//!
//! Auto-layout is a small Sugiyama-style pass: Kahn ranking with
//! longest-path layer assignment, barycenter ordering sweeps within layers,
//! then coordinate packing. It is invoked only on an explicit "auto layout"
//! action or for a phase with no saved position; everything else about the
//! canvas (pinned drags, the active direction) lives in [`LayoutState`] and
//! round-trips through the persisted document unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::PhaseGraph;
use crate::types::Position;

/// Global flow direction of the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Top to bottom.
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    /// Left to right.
    #[serde(rename = "LR")]
    LeftRight,
}

/// Side of a node a connection handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleSide {
    /// Top edge.
    Top,
    /// Bottom edge.
    Bottom,
    /// Left edge.
    Left,
    /// Right edge.
    Right,
}

impl Direction {
    /// Side exit handles sit on. Flipping direction changes only this and
    /// [`Self::target_handle`]; node positions are untouched.
    pub fn source_handle(self) -> HandleSide {
        match self {
            Self::TopBottom => HandleSide::Bottom,
            Self::LeftRight => HandleSide::Right,
        }
    }

    /// Side incoming handles sit on.
    pub fn target_handle(self) -> HandleSide {
        match self {
            Self::TopBottom => HandleSide::Top,
            Self::LeftRight => HandleSide::Left,
        }
    }
}

/// Node rendering size the layout spaces for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeSizePreset {
    /// Compact node cards.
    #[default]
    Collapsed,
    /// Detail-visible node cards; wider spacing.
    Expanded,
}

impl NodeSizePreset {
    /// Node extent along the flow axis.
    fn node_main(self) -> f64 {
        match self {
            Self::Collapsed => 80.0,
            Self::Expanded => 220.0,
        }
    }

    /// Node extent across the flow axis.
    fn node_cross(self) -> f64 {
        match self {
            Self::Collapsed => 180.0,
            Self::Expanded => 280.0,
        }
    }

    /// Separation between consecutive layers.
    fn layer_gap(self) -> f64 {
        match self {
            Self::Collapsed => 60.0,
            Self::Expanded => 120.0,
        }
    }

    /// Separation between nodes within a layer.
    fn node_gap(self) -> f64 {
        match self {
            Self::Collapsed => 40.0,
            Self::Expanded => 80.0,
        }
    }
}

/// Persisted canvas state: the active direction plus every known node
/// position. This is the layout's entire cross-session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutState {
    /// Canvas flow direction.
    #[serde(default)]
    pub direction: Direction,
    /// Saved position per phase name.
    #[serde(default)]
    pub node_positions: BTreeMap<String, Position>,
}

impl LayoutState {
    /// Create an empty state with the given direction.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            node_positions: BTreeMap::new(),
        }
    }

    /// Saved position of a phase, if any.
    pub fn position(&self, name: &str) -> Option<Position> {
        self.node_positions.get(name).copied()
    }

    /// Pin a phase's position (drag-end).
    pub fn pin(&mut self, name: impl Into<String>, position: Position) {
        self.node_positions.insert(name.into(), position);
    }

    /// Drop the saved position of a phase (e.g. it was removed).
    pub fn unpin(&mut self, name: &str) {
        self.node_positions.remove(name);
    }

    /// Rename the key of a saved position alongside a phase rename.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) {
        if let Some(pos) = self.node_positions.remove(old) {
            self.node_positions.insert(new.into(), pos);
        }
    }

    /// Explicit "auto layout": recompute and pin every phase's position.
    pub fn relayout(&mut self, graph: &PhaseGraph, preset: NodeSizePreset) {
        self.node_positions = auto_layout(graph, self.direction, preset);
    }

    /// Give a newly added phase a position without disturbing pinned ones.
    ///
    /// The phase is appended past the current extent along the flow axis.
    /// Phases that already have a saved position are left alone.
    pub fn ensure_position(&mut self, name: &str, preset: NodeSizePreset) {
        if self.node_positions.contains_key(name) {
            return;
        }
        let mut max_main: f64 = 0.0;
        for pos in self.node_positions.values() {
            let main = match self.direction {
                Direction::TopBottom => pos.y,
                Direction::LeftRight => pos.x,
            };
            max_main = max_main.max(main + preset.node_main());
        }
        let main = if self.node_positions.is_empty() {
            0.0
        } else {
            max_main + preset.layer_gap()
        };
        let position = match self.direction {
            Direction::TopBottom => Position::new(0.0, main),
            Direction::LeftRight => Position::new(main, 0.0),
        };
        self.node_positions.insert(name.to_string(), position);
    }

    /// Copy saved positions onto the graph's phases.
    pub fn apply_to(&self, graph: &mut PhaseGraph) {
        for (name, pos) in &self.node_positions {
            if let Some(phase) = graph.phase_mut(name) {
                phase.position = *pos;
            }
        }
    }
}

/// Compute layered positions for every phase.
///
/// Deterministic for a given graph: ranks come from Kahn order with
/// longest-path refinement, in-layer order from two barycenter sweeps with
/// stable tie-breaks, coordinates from simple cursor packing. Phases caught
/// in a cycle are appended to the final layers rather than dropped, so the
/// canvas always shows every node.
pub fn auto_layout(
    graph: &PhaseGraph,
    direction: Direction,
    preset: NodeSizePreset,
) -> BTreeMap<String, Position> {
    let names: Vec<&str> = graph.phases().iter().map(|p| p.name.as_str()).collect();
    if names.is_empty() {
        return BTreeMap::new();
    }

    let ranks = compute_ranks(graph, &names);
    let max_rank = ranks.iter().copied().max().unwrap_or(0);

    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
    for (idx, &rank) in ranks.iter().enumerate() {
        layers[rank].push(idx);
    }

    order_layers(graph, &names, &mut layers);

    // Pack coordinates: layers advance along the flow axis, nodes within a
    // layer along the cross axis.
    let mut positions = BTreeMap::new();
    let mut main = 0.0;
    for layer in &layers {
        let mut cross = 0.0;
        for &idx in layer {
            let position = match direction {
                Direction::TopBottom => Position::new(cross, main),
                Direction::LeftRight => Position::new(main, cross),
            };
            positions.insert(names[idx].to_string(), position);
            cross += preset.node_cross() + preset.node_gap();
        }
        main += preset.node_main() + preset.layer_gap();
    }
    positions
}

/// Longest-path layer per phase, tolerant of cycles.
fn compute_ranks(graph: &PhaseGraph, names: &[&str]) -> Vec<usize> {
    let n = names.len();
    let index_of = |name: &str| names.iter().position(|&n| n == name);

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for rule in graph.rules() {
        if let (Some(s), Some(t)) = (index_of(&rule.source_phase), index_of(&rule.target_phase)) {
            if s != t && !adjacency[s].contains(&t) {
                adjacency[s].push(t);
                in_degree[t] += 1;
            }
        }
    }

    let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut head = 0;
    while head < queue.len() {
        let node = queue[head];
        head += 1;
        order.push(node);
        for &next in &adjacency[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push(next);
            }
        }
    }
    // Cyclic leftovers still get drawn: append them in insertion order.
    if order.len() < n {
        for i in 0..n {
            if !order.contains(&i) {
                order.push(i);
            }
        }
    }

    let mut ranks = vec![0usize; n];
    for &node in &order {
        for &next in &adjacency[node] {
            ranks[next] = ranks[next].max(ranks[node] + 1);
        }
    }
    ranks
}

/// Two barycenter sweeps (down then up), stable on ties.
fn order_layers(graph: &PhaseGraph, names: &[&str], layers: &mut [Vec<usize>]) {
    if layers.len() <= 1 {
        return;
    }
    let n = names.len();
    let index_of = |name: &str| names.iter().position(|&nm| nm == name);

    let mut parents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for rule in graph.rules() {
        if let (Some(s), Some(t)) = (index_of(&rule.source_phase), index_of(&rule.target_phase)) {
            if s != t {
                children[s].push(t);
                parents[t].push(s);
            }
        }
    }

    let mut slot_of = vec![0usize; n];
    let refresh = |layers: &[Vec<usize>], slot_of: &mut Vec<usize>| {
        for layer in layers {
            for (slot, &idx) in layer.iter().enumerate() {
                slot_of[idx] = slot;
            }
        }
    };
    refresh(layers, &mut slot_of);

    let barycenter = |idx: usize, neighbors: &[Vec<usize>], slot_of: &[usize]| -> f64 {
        let list = &neighbors[idx];
        if list.is_empty() {
            return slot_of[idx] as f64;
        }
        list.iter().map(|&p| slot_of[p] as f64).sum::<f64>() / list.len() as f64
    };

    for _ in 0..2 {
        for layer_idx in 1..layers.len() {
            let mut keyed: Vec<(f64, usize, usize)> = layers[layer_idx]
                .iter()
                .map(|&idx| (barycenter(idx, &parents, &slot_of), slot_of[idx], idx))
                .collect();
            keyed.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            layers[layer_idx] = keyed.into_iter().map(|(_, _, idx)| idx).collect();
            refresh(layers, &mut slot_of);
        }
        for layer_idx in (0..layers.len() - 1).rev() {
            let mut keyed: Vec<(f64, usize, usize)> = layers[layer_idx]
                .iter()
                .map(|&idx| (barycenter(idx, &children, &slot_of), slot_of[idx], idx))
                .collect();
            keyed.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            layers[layer_idx] = keyed.into_iter().map(|(_, _, idx)| idx).collect();
            refresh(layers, &mut slot_of);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdvancementRule, Phase, PhaseType};

    fn pipeline() -> PhaseGraph {
        let mut graph = PhaseGraph::new();
        for (name, t) in [
            ("Draw", PhaseType::Draw),
            ("Pools", PhaseType::Pools),
            ("SE", PhaseType::SingleElimination),
            ("Award", PhaseType::Award),
        ] {
            graph.add_phase(Phase::new(name, t)).unwrap();
        }
        graph.add_or_update_rule(AdvancementRule::new("Draw", "Pools", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("Pools", "SE", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("SE", "Award", 1, 1));
        graph
    }

    #[test]
    fn layers_advance_down_for_tb() {
        let positions = auto_layout(&pipeline(), Direction::TopBottom, NodeSizePreset::Collapsed);
        assert!(positions["Draw"].y < positions["Pools"].y);
        assert!(positions["Pools"].y < positions["SE"].y);
        assert!(positions["SE"].y < positions["Award"].y);
        // Single node per layer sits at the cross-axis origin.
        assert_eq!(positions["Draw"].x, 0.0);
    }

    #[test]
    fn layers_advance_right_for_lr() {
        let positions = auto_layout(&pipeline(), Direction::LeftRight, NodeSizePreset::Collapsed);
        assert!(positions["Draw"].x < positions["Pools"].x);
        assert!(positions["SE"].x < positions["Award"].x);
    }

    #[test]
    fn siblings_pack_without_overlap() {
        let mut graph = PhaseGraph::new();
        graph.add_phase(Phase::new("Draw", PhaseType::Draw)).unwrap();
        graph.add_phase(Phase::new("Gold", PhaseType::SingleElimination)).unwrap();
        graph.add_phase(Phase::new("Silver", PhaseType::SingleElimination)).unwrap();
        graph.add_or_update_rule(AdvancementRule::new("Draw", "Gold", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("Draw", "Silver", 2, 1));

        let preset = NodeSizePreset::Collapsed;
        let positions = auto_layout(&graph, Direction::TopBottom, preset);
        assert_eq!(positions["Gold"].y, positions["Silver"].y);
        let dx = (positions["Gold"].x - positions["Silver"].x).abs();
        assert!(dx >= preset.node_cross());
    }

    #[test]
    fn expanded_preset_spreads_wider() {
        let graph = pipeline();
        let collapsed = auto_layout(&graph, Direction::TopBottom, NodeSizePreset::Collapsed);
        let expanded = auto_layout(&graph, Direction::TopBottom, NodeSizePreset::Expanded);
        assert!(expanded["Award"].y > collapsed["Award"].y);
    }

    #[test]
    fn layout_is_deterministic() {
        let graph = pipeline();
        let a = auto_layout(&graph, Direction::TopBottom, NodeSizePreset::Collapsed);
        let b = auto_layout(&graph, Direction::TopBottom, NodeSizePreset::Collapsed);
        assert_eq!(a, b);
    }

    #[test]
    fn cyclic_phases_still_get_positions() {
        let mut graph = PhaseGraph::new();
        graph.add_phase(Phase::new("A", PhaseType::Swiss)).unwrap();
        graph.add_phase(Phase::new("B", PhaseType::Swiss)).unwrap();
        graph.add_or_update_rule(AdvancementRule::new("A", "B", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("B", "A", 1, 1));

        let positions = auto_layout(&graph, Direction::TopBottom, NodeSizePreset::Collapsed);
        assert_eq!(positions.len(), 2);
    }

    #[test]
    fn direction_flip_changes_handles_not_positions() {
        assert_eq!(Direction::TopBottom.source_handle(), HandleSide::Bottom);
        assert_eq!(Direction::TopBottom.target_handle(), HandleSide::Top);
        assert_eq!(Direction::LeftRight.source_handle(), HandleSide::Right);
        assert_eq!(Direction::LeftRight.target_handle(), HandleSide::Left);

        let mut state = LayoutState::new(Direction::TopBottom);
        state.pin("Draw", Position::new(10.0, 20.0));
        state.direction = Direction::LeftRight;
        assert_eq!(state.position("Draw"), Some(Position::new(10.0, 20.0)));
    }

    #[test]
    fn ensure_position_appends_past_extent_and_respects_pins() {
        let preset = NodeSizePreset::Collapsed;
        let mut state = LayoutState::new(Direction::TopBottom);
        state.pin("Draw", Position::new(0.0, 100.0));

        state.ensure_position("Award", preset);
        let award = state.position("Award").unwrap();
        assert!(award.y >= 100.0 + preset.node_main());

        // Already-saved positions are never recomputed.
        state.ensure_position("Draw", preset);
        assert_eq!(state.position("Draw"), Some(Position::new(0.0, 100.0)));
    }

    #[test]
    fn relayout_pins_every_phase() {
        let graph = pipeline();
        let mut state = LayoutState::new(Direction::TopBottom);
        state.pin("Draw", Position::new(999.0, 999.0));
        state.relayout(&graph, NodeSizePreset::Collapsed);
        assert_eq!(state.node_positions.len(), 4);
        assert_ne!(state.position("Draw"), Some(Position::new(999.0, 999.0)));
    }

    #[test]
    fn layout_state_serde_uses_tb_lr() {
        let mut state = LayoutState::new(Direction::LeftRight);
        state.pin("Draw", Position::new(1.0, 2.0));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["direction"], "LR");
        assert_eq!(json["nodePositions"]["Draw"]["x"], 1.0);
    }

    #[test]
    fn barycenter_sweep_follows_parents() {
        // Draw feeds A then B; C and D sit below, with C fed by B and D by
        // A. The sweep should order the second layer to track its parents.
        let mut graph = PhaseGraph::new();
        graph.add_phase(Phase::new("Draw", PhaseType::Draw)).unwrap();
        graph.add_phase(Phase::new("A", PhaseType::Pools)).unwrap();
        graph.add_phase(Phase::new("B", PhaseType::Pools)).unwrap();
        graph.add_phase(Phase::new("C", PhaseType::SingleElimination)).unwrap();
        graph.add_phase(Phase::new("D", PhaseType::SingleElimination)).unwrap();
        graph.add_or_update_rule(AdvancementRule::new("Draw", "A", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("Draw", "B", 2, 1));
        graph.add_or_update_rule(AdvancementRule::new("B", "C", 1, 1));
        graph.add_or_update_rule(AdvancementRule::new("A", "D", 1, 1));

        let positions = auto_layout(&graph, Direction::TopBottom, NodeSizePreset::Collapsed);
        // A is left of B (insertion order), so D (fed by A) ends left of C.
        assert!(positions["A"].x < positions["B"].x);
        assert!(positions["D"].x < positions["C"].x);
    }
}
