//! Core types for the phase graph.

pub mod phase;
pub mod rule;
pub mod slot;

pub use phase::{Phase, PhaseType, Position};
pub use rule::AdvancementRule;
pub use slot::{pool_letter, ExitSlot};
