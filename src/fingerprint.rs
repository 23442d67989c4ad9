//! Canonical hashing for dirty detection.
//!
//! Editor hosts compare the fingerprint taken at load time against the
//! current one to decide whether there are unsaved changes. Determinism
//! rules: stable field order (declaration order), stable Vec order, maps
//! must be `BTreeMap` in hashed data.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::graph::PhaseGraph;
use crate::layout::LayoutState;
use crate::types::AdvancementRule;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("canonical serialization failed")
}

/// Compute the canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Canonical hash as a hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Fingerprint of a graph plus its canvas state.
///
/// Phases hash in insertion order; rules are sorted into canonical order
/// first so that mere reordering of the rule set is not a change.
pub fn graph_fingerprint(graph: &PhaseGraph, layout: &LayoutState) -> String {
    let mut rules: Vec<&AdvancementRule> = graph.rules().iter().collect();
    rules.sort();
    canonical_hash_hex(&(graph.phases(), rules, layout))
}
