//! Contract metadata analyzer
//!
//! Derives the menu's semantic content (operation names, parameter
//! names/types, read-only classification) from either a structured
//! descriptor or textual source. The descriptor is authoritative when both
//! are available; textual parsing of module-level state still runs to
//! enrich diagnostics.

mod descriptor;
mod source;
pub mod types;

use tracing::warn;

pub use descriptor::{parse_descriptor, ContractDescriptor};
pub use source::{parse_operations, parse_state};
pub use types::{Operation, Parameter, StateDeclaration, TypeTag};

/// Analyzed model of one wrapped contract
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ContractModel {
    pub operations: Vec<Operation>,
    pub state: Vec<StateDeclaration>,
}

/// Analyze available inputs into a contract model.
///
/// Descriptor parse errors fall back to textual parsing; textual parsing of
/// unrecognizable input yields an empty operation list. Zero operations is a
/// valid, if uninteresting, state.
pub fn analyze(descriptor: Option<&str>, source: Option<&str>) -> ContractModel {
    let operations = match descriptor {
        Some(json) => match parse_descriptor(json) {
            Ok(ops) => ops,
            Err(e) => {
                warn!(error = %e, "Descriptor unparseable, falling back to source text");
                source.map(parse_operations).unwrap_or_default()
            }
        },
        None => source.map(parse_operations).unwrap_or_default(),
    };

    let state = source.map(parse_state).unwrap_or_default();

    ContractModel { operations, state }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        export ledger round: Counter;
        export circuit reset(): [] { }
    "#;

    #[test]
    fn test_descriptor_takes_precedence() {
        let descriptor = r#"{"circuits":[{"name":"advance","arguments":[],"pure":false}]}"#;
        let model = analyze(Some(descriptor), Some(SOURCE));
        assert_eq!(model.operations.len(), 1);
        assert_eq!(model.operations[0].name, "advance");
        // State still comes from source
        assert_eq!(model.state.len(), 1);
        assert_eq!(model.state[0].name, "round");
    }

    #[test]
    fn test_bad_descriptor_falls_back_to_source() {
        let model = analyze(Some("definitely not json"), Some(SOURCE));
        assert_eq!(model.operations.len(), 1);
        assert_eq!(model.operations[0].name, "reset");
    }

    #[test]
    fn test_no_inputs_is_a_valid_empty_model() {
        let model = analyze(None, None);
        assert!(model.operations.is_empty());
        assert!(model.state.is_empty());
    }
}
