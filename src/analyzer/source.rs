// src/analyzer/source.rs
// Textual fallback: derive operations and state declarations from contract
// source by surface pattern matching. Never fails; unparseable input yields
// an empty model.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::types::{split_top_level, Operation, Parameter, StateDeclaration, TypeTag};

/// `export circuit <name>(<params>): <ret> {`
static CIRCUIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*export\s+circuit\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*:\s*([^{]+?)\s*\{")
        .expect("circuit pattern is valid")
});

/// `export <kind> <name>: <type>;`
static STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*export\s+([a-z]+)\s+([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([^;{]+);")
        .expect("state pattern is valid")
});

/// Extract operation declarations from raw source text.
///
/// The textual surface carries no purity flag, so read-only classification
/// falls entirely to the return-type heuristic.
pub fn parse_operations(source: &str) -> Vec<Operation> {
    let operations: Vec<Operation> = CIRCUIT_RE
        .captures_iter(source)
        .map(|caps| {
            let name = caps[1].to_string();
            let parameters = parse_parameters(&caps[2]);
            let return_type = TypeTag::from_raw(&caps[3]);
            Operation::new(name, parameters, return_type, None)
        })
        .collect();

    debug!(count = operations.len(), "Parsed operations from source text");
    operations
}

/// Extract module-level state declarations, used to enrich diagnostics even
/// when the structured descriptor is authoritative.
pub fn parse_state(source: &str) -> Vec<StateDeclaration> {
    STATE_RE
        .captures_iter(source)
        .filter(|caps| &caps[1] != "circuit")
        .map(|caps| StateDeclaration {
            kind: caps[1].to_string(),
            name: caps[2].to_string(),
            type_tag: TypeTag::from_raw(&caps[3]),
        })
        .collect()
}

fn parse_parameters(raw: &str) -> Vec<Parameter> {
    split_top_level(raw)
        .into_iter()
        .filter_map(|part| {
            let (name, ty) = part.split_once(':')?;
            Some(Parameter {
                name: name.trim().to_string(),
                type_tag: TypeTag::from_raw(ty),
            })
        })
        .collect()
}
