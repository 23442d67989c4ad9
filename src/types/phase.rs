//! Phase types for the phase graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of competition structure a phase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhaseType {
    /// Entry point: seeds competitors into the structure. No incoming slots.
    Draw,
    /// Everyone plays everyone.
    RoundRobin,
    /// Single elimination bracket.
    SingleElimination,
    /// Double elimination bracket.
    DoubleElimination,
    /// Pool play: sub-groups ranked independently.
    Pools,
    /// Swiss pairing rounds.
    Swiss,
    /// One round of head-to-head matches; may expose winner and loser exits.
    BracketRound,
    /// Terminal point: receives final placements. No advancing slots.
    Award,
}

impl PhaseType {
    /// Parse a phase type from its wire string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Draw" => Some(Self::Draw),
            "RoundRobin" => Some(Self::RoundRobin),
            "SingleElimination" => Some(Self::SingleElimination),
            "DoubleElimination" => Some(Self::DoubleElimination),
            "Pools" => Some(Self::Pools),
            "Swiss" => Some(Self::Swiss),
            "BracketRound" => Some(Self::BracketRound),
            "Award" => Some(Self::Award),
            _ => None,
        }
    }

    /// Whether this is the structure entry point.
    pub fn is_draw(self) -> bool {
        self == Self::Draw
    }

    /// Whether this is the structure terminal point.
    pub fn is_award(self) -> bool {
        self == Self::Award
    }
}

impl fmt::Display for PhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draw => "Draw",
            Self::RoundRobin => "RoundRobin",
            Self::SingleElimination => "SingleElimination",
            Self::DoubleElimination => "DoubleElimination",
            Self::Pools => "Pools",
            Self::Swiss => "Swiss",
            Self::BracketRound => "BracketRound",
            Self::Award => "Award",
        };
        write!(f, "{}", s)
    }
}

/// Canvas coordinates for one phase node. Presentation only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One stage of a tournament structure.
///
/// `name` is the canonical join key: advancement rules reference phases by
/// name, never by array index. `position` is owned by the layout engine and
/// round-trips through the canvas layout map, not the phase record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Unique name within the graph.
    pub name: String,
    /// Kind of structure this phase runs.
    pub phase_type: PhaseType,
    /// Scheduling sequence, recomputed by the sequencer.
    #[serde(default)]
    pub sort_order: u32,
    /// Number of entry slots (0 for Draw).
    #[serde(default)]
    pub incoming_slot_count: u32,
    /// Number of exit slots (0 for Award).
    #[serde(default)]
    pub advancing_slot_count: u32,
    /// Number of pools; meaningful only for `PhaseType::Pools`.
    #[serde(default)]
    pub pool_count: u32,
    /// Match format (best of N games).
    #[serde(default)]
    pub best_of: u32,
    /// Whether a bracket round also routes losers onward.
    #[serde(default)]
    pub include_consolation: bool,
    /// Award-phase presentation kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_type: Option<String>,
    /// Draw-phase seeding procedure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_method: Option<String>,
    /// Seeding strategy for bracket phases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeding_strategy: Option<String>,
    /// Canvas coordinates; persisted via the canvas layout, not here.
    #[serde(skip)]
    pub position: Position,
}

impl Phase {
    /// Create a phase with zeroed slot counts and default attributes.
    pub fn new(name: impl Into<String>, phase_type: PhaseType) -> Self {
        Self {
            name: name.into(),
            phase_type,
            sort_order: 0,
            incoming_slot_count: 0,
            advancing_slot_count: 0,
            pool_count: 0,
            best_of: 0,
            include_consolation: false,
            award_type: None,
            draw_method: None,
            seeding_strategy: None,
            position: Position::default(),
        }
    }

    /// Set incoming and advancing slot counts.
    pub fn with_slots(mut self, incoming: u32, advancing: u32) -> Self {
        self.incoming_slot_count = incoming;
        self.advancing_slot_count = advancing;
        self
    }

    /// Set the pool count.
    pub fn with_pools(mut self, pool_count: u32) -> Self {
        self.pool_count = pool_count;
        self
    }

    /// Mark a bracket round as routing losers onward.
    pub fn with_consolation(mut self) -> Self {
        self.include_consolation = true;
        self
    }

    /// Number of head-to-head matches in a bracket round.
    pub fn match_count(&self) -> u32 {
        self.incoming_slot_count / 2
    }

    /// Whether this phase exposes both winner and loser exit slots.
    ///
    /// True for a bracket round that either explicitly includes a
    /// consolation route or advances at least as many slots as it takes in.
    pub fn exposes_loser_exits(&self) -> bool {
        self.phase_type == PhaseType::BracketRound
            && (self.include_consolation
                || self.advancing_slot_count >= self.incoming_slot_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_type_wire_names_round_trip() {
        for t in [
            PhaseType::Draw,
            PhaseType::RoundRobin,
            PhaseType::SingleElimination,
            PhaseType::DoubleElimination,
            PhaseType::Pools,
            PhaseType::Swiss,
            PhaseType::BracketRound,
            PhaseType::Award,
        ] {
            assert_eq!(PhaseType::from_str(&t.to_string()), Some(t));
        }
        assert_eq!(PhaseType::from_str("NotAPhase"), None);
    }

    #[test]
    fn loser_exits_require_consolation_or_full_advancement() {
        let mut round = Phase::new("R1", PhaseType::BracketRound).with_slots(8, 4);
        assert!(!round.exposes_loser_exits());

        round.include_consolation = true;
        assert!(round.exposes_loser_exits());

        let full = Phase::new("R2", PhaseType::BracketRound).with_slots(8, 8);
        assert!(full.exposes_loser_exits());

        let pools = Phase::new("P", PhaseType::Pools).with_slots(8, 8);
        assert!(!pools.exposes_loser_exits());
    }

    #[test]
    fn phase_serializes_camel_case_without_position() {
        let phase = Phase::new("QF", PhaseType::SingleElimination).with_slots(8, 4);
        let json = serde_json::to_value(&phase).unwrap();
        assert_eq!(json["phaseType"], "SingleElimination");
        assert_eq!(json["incomingSlotCount"], 8);
        assert!(json.get("position").is_none());
    }
}
