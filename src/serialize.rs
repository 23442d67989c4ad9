//! Bidirectional JSON serialization of the phase graph.
//!
//! The persisted document is an opaque field on a template resource owned
//! by an external CRUD layer. Two rule reference formats are accepted on
//! read: the current name-based form and a legacy form that joined rules to
//! phases by the numeric `sortOrder` each phase held at save time. Legacy
//! references are normalized to names at parse time; there is never a second
//! live representation.

use serde::{Deserialize, Serialize};

use crate::graph::PhaseGraph;
use crate::layout::LayoutState;
use crate::types::{AdvancementRule, Phase};

/// Error type for parsing a stored document.
///
/// JSON syntax failures prevent even constructing a graph and are distinct
/// from structural validation, which runs afterwards on the parsed graph.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed document.
    #[error("malformed template document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A rule as stored on the wire: name-based, or legacy order-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    /// Source phase name (current format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_phase: Option<String>,
    /// Target phase name (current format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_phase: Option<String>,
    /// Source phase `sortOrder` at save time (legacy format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_phase_order: Option<u32>,
    /// Target phase `sortOrder` at save time (legacy format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_phase_order: Option<u32>,
    /// Exit rank within the source.
    pub finish_position: u32,
    /// Incoming slot at the target.
    pub target_slot_number: u32,
    /// Pool of the exit slot, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_pool_index: Option<u32>,
}

impl From<&AdvancementRule> for RuleRecord {
    fn from(rule: &AdvancementRule) -> Self {
        Self {
            source_phase: Some(rule.source_phase.clone()),
            target_phase: Some(rule.target_phase.clone()),
            source_phase_order: None,
            target_phase_order: None,
            finish_position: rule.finish_position,
            target_slot_number: rule.target_slot_number,
            source_pool_index: rule.source_pool_index,
        }
    }
}

/// The persisted document shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDocument {
    /// All phases.
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// All advancement rules, in either reference format.
    #[serde(default)]
    pub advancement_rules: Vec<RuleRecord>,
    /// Persisted canvas direction and node positions.
    #[serde(default)]
    pub canvas_layout: LayoutState,
}

/// Result of parsing a document: the graph, its canvas state, and any
/// references that had to be dropped along the way.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The reconstructed graph, positions applied.
    pub graph: PhaseGraph,
    /// The persisted canvas state, carried through unchanged.
    pub layout: LayoutState,
    /// One entry per dropped rule reference.
    pub warnings: Vec<String>,
}

/// Parse a stored JSON document into a graph.
pub fn parse(json: &str) -> Result<ParseOutcome, ParseError> {
    let doc: TemplateDocument = serde_json::from_str(json)?;
    Ok(from_document(doc))
}

/// Build a graph from an already-deserialized document.
///
/// Legacy order-based rules are resolved against the `sortOrder` each phase
/// carries in the document and rewritten to names. Rules whose references
/// cannot be resolved are dropped with a warning; the phases themselves are
/// kept verbatim so the validator can report structural problems.
pub fn from_document(doc: TemplateDocument) -> ParseOutcome {
    let mut graph = PhaseGraph::new();
    let mut warnings = Vec::new();

    for phase in doc.phases {
        graph.push_phase_unchecked(phase);
    }

    for (idx, record) in doc.advancement_rules.into_iter().enumerate() {
        match resolve_rule(&graph, &record) {
            Ok(rule) => graph.push_rule_unchecked(rule),
            Err(reason) => {
                let warning = format!("dropped advancement rule #{}: {}", idx, reason);
                tracing::warn!(rule = idx, reason, "dropped unresolvable advancement rule");
                warnings.push(warning);
            }
        }
    }

    let layout = doc.canvas_layout;
    layout.apply_to(&mut graph);

    ParseOutcome {
        graph,
        layout,
        warnings,
    }
}

/// Serialize a graph and its canvas state into the persisted document.
pub fn serialize(graph: &PhaseGraph, layout: &LayoutState) -> TemplateDocument {
    TemplateDocument {
        phases: graph.phases().to_vec(),
        advancement_rules: graph.rules().iter().map(RuleRecord::from).collect(),
        canvas_layout: layout.clone(),
    }
}

/// Serialize to a compact JSON string.
pub fn to_json_string(graph: &PhaseGraph, layout: &LayoutState) -> Result<String, ParseError> {
    Ok(serde_json::to_string(&serialize(graph, layout))?)
}

/// Serialize to a pretty JSON string.
pub fn to_json_string_pretty(
    graph: &PhaseGraph,
    layout: &LayoutState,
) -> Result<String, ParseError> {
    Ok(serde_json::to_string_pretty(&serialize(graph, layout))?)
}

fn resolve_rule(graph: &PhaseGraph, record: &RuleRecord) -> Result<AdvancementRule, String> {
    let source = resolve_endpoint(
        graph,
        record.source_phase.as_deref(),
        record.source_phase_order,
        "source",
    )?;
    let target = resolve_endpoint(
        graph,
        record.target_phase.as_deref(),
        record.target_phase_order,
        "target",
    )?;
    Ok(AdvancementRule {
        source_phase: source,
        target_phase: target,
        finish_position: record.finish_position,
        target_slot_number: record.target_slot_number,
        source_pool_index: record.source_pool_index,
    })
}

/// Names take precedence over legacy orders when both are present.
fn resolve_endpoint(
    graph: &PhaseGraph,
    name: Option<&str>,
    order: Option<u32>,
    role: &str,
) -> Result<String, String> {
    if let Some(name) = name {
        if graph.contains_phase(name) {
            return Ok(name.to_string());
        }
        return Err(format!("{} phase \"{}\" does not exist", role, name));
    }
    if let Some(order) = order {
        return graph
            .phases()
            .iter()
            .find(|p| p.sort_order == order)
            .map(|p| p.name.clone())
            .ok_or_else(|| format!("no phase has {} order {}", role, order));
    }
    Err(format!("rule has no {} reference", role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Direction;
    use crate::types::{PhaseType, Position};

    fn sample_graph() -> (PhaseGraph, LayoutState) {
        let mut graph = PhaseGraph::new();
        let mut draw = Phase::new("Draw", PhaseType::Draw).with_slots(0, 8);
        draw.sort_order = 1;
        let mut se = Phase::new("SE", PhaseType::SingleElimination).with_slots(8, 1);
        se.sort_order = 2;
        let mut award = Phase::new("Award", PhaseType::Award).with_slots(1, 0);
        award.sort_order = 3;
        graph.add_phase(draw).unwrap();
        graph.add_phase(se).unwrap();
        graph.add_phase(award).unwrap();
        for i in 1..=8 {
            graph.add_or_update_rule(AdvancementRule::new("Draw", "SE", i, i));
        }
        graph.add_or_update_rule(AdvancementRule::new("SE", "Award", 1, 1));

        let mut layout = LayoutState::new(Direction::TopBottom);
        layout.pin("Draw", Position::new(0.0, 0.0));
        layout.pin("SE", Position::new(0.0, 140.0));
        layout.pin("Award", Position::new(0.0, 280.0));
        layout.apply_to(&mut graph);
        (graph, layout)
    }

    #[test]
    fn round_trip_preserves_structure() {
        let (graph, layout) = sample_graph();
        let json = to_json_string(&graph, &layout).unwrap();
        let outcome = parse(&json).unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.graph, graph);
        assert_eq!(outcome.layout, layout);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(parse("{ not json"), Err(ParseError::Json(_))));
    }

    #[test]
    fn legacy_orders_resolve_to_names() {
        let json = r#"{
            "phases": [
                { "name": "Draw", "phaseType": "Draw", "sortOrder": 1, "advancingSlotCount": 4 },
                { "name": "SE", "phaseType": "SingleElimination", "sortOrder": 2, "incomingSlotCount": 4 }
            ],
            "advancementRules": [
                { "sourcePhaseOrder": 1, "targetPhaseOrder": 2, "finishPosition": 1, "targetSlotNumber": 1 },
                { "sourcePhaseOrder": 1, "targetPhaseOrder": 2, "finishPosition": 2, "targetSlotNumber": 2 }
            ]
        }"#;
        let outcome = parse(json).unwrap();
        assert!(outcome.warnings.is_empty());
        let rules = outcome.graph.rules();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.source_phase == "Draw" && r.target_phase == "SE"));
    }

    #[test]
    fn unresolvable_references_drop_with_warnings() {
        let json = r#"{
            "phases": [
                { "name": "Draw", "phaseType": "Draw", "sortOrder": 1 }
            ],
            "advancementRules": [
                { "sourcePhaseOrder": 9, "targetPhaseOrder": 1, "finishPosition": 1, "targetSlotNumber": 1 },
                { "sourcePhase": "Draw", "targetPhase": "Ghost", "finishPosition": 1, "targetSlotNumber": 1 },
                { "finishPosition": 1, "targetSlotNumber": 1 }
            ]
        }"#;
        let outcome = parse(json).unwrap();
        assert_eq!(outcome.graph.rule_count(), 0);
        assert_eq!(outcome.warnings.len(), 3);
        assert!(outcome.warnings[0].contains("order 9"));
        assert!(outcome.warnings[1].contains("\"Ghost\""));
        assert!(outcome.warnings[2].contains("no source reference"));
    }

    #[test]
    fn names_take_precedence_over_legacy_orders() {
        let json = r#"{
            "phases": [
                { "name": "Pools", "phaseType": "Pools", "sortOrder": 1 },
                { "name": "SE", "phaseType": "SingleElimination", "sortOrder": 2 }
            ],
            "advancementRules": [
                { "sourcePhase": "Pools", "sourcePhaseOrder": 2,
                  "targetPhase": "SE", "targetPhaseOrder": 1,
                  "finishPosition": 1, "targetSlotNumber": 1, "sourcePoolIndex": 0 }
            ]
        }"#;
        let outcome = parse(json).unwrap();
        let rule = &outcome.graph.rules()[0];
        assert_eq!(rule.source_phase, "Pools");
        assert_eq!(rule.target_phase, "SE");
        assert_eq!(rule.source_pool_index, Some(0));
    }

    #[test]
    fn positions_round_trip_through_canvas_layout() {
        let (graph, layout) = sample_graph();
        let doc = serialize(&graph, &layout);
        // Phase records never carry positions.
        let phases_json = serde_json::to_value(&doc.phases).unwrap();
        assert!(phases_json[0].get("position").is_none());

        let outcome = from_document(doc);
        assert_eq!(
            outcome.graph.phase("SE").unwrap().position,
            Position::new(0.0, 140.0)
        );
    }

    #[test]
    fn serialized_rules_are_name_based() {
        let (graph, layout) = sample_graph();
        let doc = serialize(&graph, &layout);
        assert!(doc
            .advancement_rules
            .iter()
            .all(|r| r.source_phase.is_some() && r.source_phase_order.is_none()));
    }
}
