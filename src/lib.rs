//! # phase-graph
//!
//! Phase/rule graph model for composing multi-phase competition structures
//! (e.g. "Pools → Single Elimination → Award").
//!
//! A tournament template is a directed graph of *phases* connected by
//! *advancement rules* that map finishers of one phase to entry slots of
//! the next. This crate is the model behind a template editor:
//!
//! 1. Parse a stored JSON document into a [`PhaseGraph`] (normalizing the
//!    legacy order-based rule format)
//! 2. Apply user-intent mutations (connect, rewire, rename, delete, preset)
//! 3. Validate structure, resequence scheduling order, compute layout
//! 4. Serialize back to the same document shape on save
//!
//! ## Architecture
//!
//! ```text
//! JSON document → Serializer → PhaseGraph → GraphValidator → {errors, warnings}
//!                                   ↓
//!                   SlotMapper / TopologicalSequencer / LayoutEngine
//! ```
//!
//! Everything here is synchronous and pure over the current graph snapshot;
//! rendering, persistence transport, and interaction mechanics are external
//! collaborators.
//!
//! ## Determinism Guarantees
//!
//! - Phase insertion order is preserved and is the tiebreak everywhere
//! - Rule ordering is canonical (source, pool, finish, target, slot)
//! - Auto-layout is a pure function of the graph, direction, and size preset

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fingerprint;
pub mod graph;
pub mod layout;
pub mod mapper;
pub mod sequencer;
pub mod serialize;
pub mod types;
pub mod validate;

// Re-exports
pub use types::{AdvancementRule, ExitSlot, Phase, PhaseType, Position};
pub use graph::{GraphError, PhaseGraph};
pub use validate::{validate, ValidationReport};
pub use mapper::{
    apply_preset, connect, cross_pool_mapping, default_mapping, exit_slot_locked,
    incoming_slot_locked, MapperError, MappingPreset, RewireOutcome, RewireSession, Selection,
};
pub use sequencer::{resync, SequenceError};
pub use layout::{auto_layout, Direction, HandleSide, LayoutState, NodeSizePreset};
pub use serialize::{
    from_document, parse, serialize, to_json_string, to_json_string_pretty, ParseError,
    ParseOutcome, RuleRecord, TemplateDocument,
};
pub use fingerprint::{canonical_hash, canonical_hash_hex, graph_fingerprint, to_canonical_bytes};

/// Schema version of the persisted template document.
/// Increment on breaking changes to the document shape.
pub const TEMPLATE_SCHEMA_VERSION: &str = "1.0.0";
