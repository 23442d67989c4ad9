//! Structural validation of a phase graph.
//!
//! `validate` is a pure function over a graph snapshot. Errors block save;
//! warnings do not. JSON syntax failures are an earlier-stage error handled
//! by the serializer and never appear here.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::PhaseGraph;
use crate::types::PhaseType;

/// Outcome of validating a graph: human-readable errors and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Problems that block saving the template.
    pub errors: Vec<String>,
    /// Problems worth surfacing that do not block saving.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Whether the graph may be saved.
    pub fn blocks_save(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the graph is fully clean.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Validate a graph's structure.
pub fn validate(graph: &PhaseGraph) -> ValidationReport {
    let mut report = ValidationReport::default();
    if graph.phase_count() == 0 {
        return report;
    }

    check_terminals(graph, &mut report);
    check_duplicate_names(graph, &mut report);
    check_connectivity(graph, &mut report);
    check_cycles(graph, &mut report);
    check_slot_claims(graph, &mut report);

    report
}

fn check_terminals(graph: &PhaseGraph, report: &mut ValidationReport) {
    if !graph.phases().iter().any(|p| p.phase_type.is_draw()) {
        report
            .errors
            .push("structure has no Draw phase (entry point)".to_string());
    }
    if !graph.phases().iter().any(|p| p.phase_type.is_award()) {
        report
            .errors
            .push("structure has no Award phase (terminal point)".to_string());
    }
}

fn check_duplicate_names(graph: &PhaseGraph, report: &mut ValidationReport) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for phase in graph.phases() {
        *counts.entry(phase.name.as_str()).or_insert(0) += 1;
    }
    for (name, count) in counts {
        if count > 1 {
            report
                .errors
                .push(format!("duplicate phase name \"{}\" used {} times", name, count));
        }
    }
}

fn check_connectivity(graph: &PhaseGraph, report: &mut ValidationReport) {
    let multi = graph.phase_count() > 1;
    for phase in graph.phases() {
        let incoming = graph.rules_into(&phase.name).count();
        let outgoing = graph.rules_from(&phase.name).count();

        match phase.phase_type {
            PhaseType::Draw => {
                if incoming > 0 {
                    report.warnings.push(format!(
                        "Draw phase \"{}\" has {} incoming rule(s)",
                        phase.name, incoming
                    ));
                }
            }
            _ => {
                if multi && incoming == 0 {
                    report.errors.push(format!(
                        "phase \"{}\" is orphaned: no incoming rules",
                        phase.name
                    ));
                }
            }
        }

        match phase.phase_type {
            PhaseType::Award => {
                if outgoing > 0 {
                    report.warnings.push(format!(
                        "Award phase \"{}\" has {} outgoing rule(s)",
                        phase.name, outgoing
                    ));
                }
            }
            _ => {
                if multi && outgoing == 0 {
                    report.warnings.push(format!(
                        "phase \"{}\" has no outgoing rules",
                        phase.name
                    ));
                }
            }
        }
    }
}

/// DFS with recursion-stack coloring. A cyclic rule set cannot be scheduled,
/// so it blocks save rather than silently dropping phases from the order.
fn check_cycles(graph: &PhaseGraph, report: &mut ValidationReport) {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let names: Vec<&str> = graph.phases().iter().map(|p| p.name.as_str()).collect();
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for rule in graph.rules() {
        adjacency
            .entry(rule.source_phase.as_str())
            .or_default()
            .insert(rule.target_phase.as_str());
    }

    let mut colors: BTreeMap<&str, Color> = names.iter().map(|n| (*n, Color::White)).collect();
    let mut on_cycle: BTreeSet<&str> = BTreeSet::new();

    fn visit<'a>(
        node: &'a str,
        adjacency: &BTreeMap<&'a str, BTreeSet<&'a str>>,
        colors: &mut BTreeMap<&'a str, Color>,
        stack: &mut Vec<&'a str>,
        on_cycle: &mut BTreeSet<&'a str>,
    ) {
        colors.insert(node, Color::Gray);
        stack.push(node);
        if let Some(targets) = adjacency.get(node) {
            for &target in targets {
                match colors.get(target).copied() {
                    Some(Color::White) => visit(target, adjacency, colors, stack, on_cycle),
                    Some(Color::Gray) => {
                        // Back edge: everything from `target` to the top of
                        // the stack is on a cycle.
                        let start = stack.iter().position(|&n| n == target).unwrap_or(0);
                        on_cycle.extend(stack[start..].iter().copied());
                    }
                    _ => {}
                }
            }
        }
        stack.pop();
        colors.insert(node, Color::Black);
    }

    let mut stack = Vec::new();
    for &name in &names {
        if colors.get(name) == Some(&Color::White) {
            visit(name, &adjacency, &mut colors, &mut stack, &mut on_cycle);
        }
    }

    if !on_cycle.is_empty() {
        let members: Vec<&str> = on_cycle.into_iter().collect();
        report.errors.push(format!(
            "advancement rules form a cycle involving: {}",
            members.join(", ")
        ));
    }
}

/// Documents authored before slot uniqueness was enforced at the mutation
/// layer can claim the same exit or incoming slot twice. Non-blocking.
fn check_slot_claims(graph: &PhaseGraph, report: &mut ValidationReport) {
    let mut exit_claims: BTreeMap<(&str, String), usize> = BTreeMap::new();
    let mut incoming_claims: BTreeMap<(&str, u32), usize> = BTreeMap::new();
    for rule in graph.rules() {
        *exit_claims
            .entry((rule.source_phase.as_str(), rule.exit_slot().id()))
            .or_insert(0) += 1;
        *incoming_claims
            .entry((rule.target_phase.as_str(), rule.target_slot_number))
            .or_insert(0) += 1;
    }
    for ((phase, slot), count) in exit_claims {
        if count > 1 {
            report.warnings.push(format!(
                "exit slot {} of \"{}\" feeds {} rules",
                slot, phase, count
            ));
        }
    }
    for ((phase, slot), count) in incoming_claims {
        if count > 1 {
            report.warnings.push(format!(
                "incoming slot {} of \"{}\" is claimed by {} rules",
                slot, phase, count
            ));
        }
    }
}
