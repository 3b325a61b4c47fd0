// src/analyzer/descriptor.rs
// Structured contract descriptor: authoritative field-level type information
// emitted by the wrapped program's toolchain.

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

use super::types::{Operation, Parameter, TypeTag};

/// Top-level descriptor document
#[derive(Debug, Clone, Deserialize)]
pub struct ContractDescriptor {
    #[serde(default)]
    pub circuits: Vec<CircuitDescriptor>,
}

/// One described circuit
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitDescriptor {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentDescriptor>,
    #[serde(rename = "result-type", default)]
    pub result_type: Option<TypeDescriptor>,
    #[serde(default)]
    pub pure: Option<bool>,
}

/// One described argument
#[derive(Debug, Clone, Deserialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

/// Type object with a `type-name` discriminator. Kept as a plain struct
/// rather than a tagged enum so unrecognized names degrade to `Unknown`
/// instead of failing the whole document.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDescriptor {
    #[serde(rename = "type-name")]
    pub type_name: String,
    #[serde(default)]
    pub maxval: Option<serde_json::Number>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub types: Option<Vec<TypeDescriptor>>,
}

impl TypeDescriptor {
    pub fn to_tag(&self) -> TypeTag {
        match self.type_name.as_str() {
            "Uint" => match &self.maxval {
                Some(max) => TypeTag::Uint {
                    max: max.to_string(),
                },
                None => TypeTag::Unknown(self.type_name.clone()),
            },
            "Bytes" => match self.length {
                Some(len) => TypeTag::Bytes { len },
                None => TypeTag::Unknown(self.type_name.clone()),
            },
            "Tuple" => TypeTag::Tuple(
                self.types
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(TypeDescriptor::to_tag)
                    .collect(),
            ),
            "Boolean" => TypeTag::Boolean,
            "Opaque" => TypeTag::Text,
            other => TypeTag::Unknown(other.to_string()),
        }
    }
}

/// Parse a descriptor document into operations.
///
/// A malformed document is an error here; the analyzer falls back to
/// textual parsing in that case.
pub fn parse_descriptor(json: &str) -> Result<Vec<Operation>> {
    let descriptor: ContractDescriptor = serde_json::from_str(json)?;

    let operations = descriptor
        .circuits
        .into_iter()
        .map(|circuit| {
            let parameters = circuit
                .arguments
                .iter()
                .map(|arg| Parameter {
                    name: arg.name.clone(),
                    type_tag: arg.ty.to_tag(),
                })
                .collect();
            let return_type = circuit
                .result_type
                .as_ref()
                .map(TypeDescriptor::to_tag)
                .unwrap_or_else(|| TypeTag::Tuple(Vec::new()));
            Operation::new(circuit.name, parameters, return_type, circuit.pure)
        })
        .collect::<Vec<_>>();

    debug!(count = operations.len(), "Parsed operations from descriptor");
    Ok(operations)
}
