// src/analyzer/types.rs
// Normalized operation model shared by the analyzer, menu, and orchestrator.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type tags
// ============================================================================

/// Closed set of normalized parameter/result type categories.
///
/// Mapping from a raw declared type to a tag is total: names the table does
/// not recognize degrade to `Unknown` and echo through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum TypeTag {
    /// Unsigned integer with an inclusive maximum, kept as decimal text so
    /// arbitrary widths survive
    Uint { max: String },
    /// Fixed-length byte sequence
    Bytes { len: u32 },
    /// Opaque text value
    Text,
    Boolean,
    /// Composite type, rendered recursively
    Tuple(Vec<TypeTag>),
    /// Unrecognized declared type, raw name preserved
    Unknown(String),
}

impl TypeTag {
    /// Human-readable label. A `Uint` label reproduces its bound.
    pub fn label(&self) -> String {
        match self {
            TypeTag::Uint { max } => format!("Uint<={}", max),
            TypeTag::Bytes { len } => format!("Bytes<{}>", len),
            TypeTag::Text => "Text".to_string(),
            TypeTag::Boolean => "Boolean".to_string(),
            TypeTag::Tuple(inner) => {
                let parts: Vec<String> = inner.iter().map(|t| t.label()).collect();
                format!("[{}]", parts.join(", "))
            }
            TypeTag::Unknown(raw) => raw.clone(),
        }
    }

    /// An empty tuple is the "no declared result" shape.
    pub fn is_empty(&self) -> bool {
        matches!(self, TypeTag::Tuple(inner) if inner.is_empty())
    }

    /// Normalize a raw declared type string from textual source.
    pub fn from_raw(raw: &str) -> TypeTag {
        let raw = raw.trim();

        if raw.is_empty() {
            return TypeTag::Tuple(Vec::new());
        }
        if let Some(inner) = strip_generic(raw, "Uint") {
            // Width form Uint<N> or range form Uint<lo..hi>
            if let Some((_, hi)) = inner.split_once("..") {
                return TypeTag::Uint {
                    max: hi.trim().to_string(),
                };
            }
            if let Ok(bits) = inner.trim().parse::<u32>() {
                return TypeTag::Uint {
                    max: pow2_minus_one(bits),
                };
            }
            return TypeTag::Unknown(raw.to_string());
        }
        if let Some(inner) = strip_generic(raw, "Bytes") {
            if let Ok(len) = inner.trim().parse::<u32>() {
                return TypeTag::Bytes { len };
            }
            return TypeTag::Unknown(raw.to_string());
        }
        if raw == "Boolean" {
            return TypeTag::Boolean;
        }
        if let Some(inner) = strip_generic(raw, "Opaque") {
            if inner.contains("string") {
                return TypeTag::Text;
            }
            return TypeTag::Unknown(raw.to_string());
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let inner = inner.trim();
            if inner.is_empty() {
                return TypeTag::Tuple(Vec::new());
            }
            let parts = split_top_level(inner)
                .into_iter()
                .map(TypeTag::from_raw)
                .collect();
            return TypeTag::Tuple(parts);
        }

        TypeTag::Unknown(raw.to_string())
    }

    /// Validate and normalize a raw argument value for this type.
    ///
    /// Numeric values are checked against the declared bound with decimal
    /// string comparison. Unrecognized types pass through as raw text; the
    /// wrapped program's expected encoding for those is undetermined.
    pub fn coerce(&self, raw: &str) -> std::result::Result<String, String> {
        match self {
            TypeTag::Uint { max } => {
                let value = raw.trim();
                if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(format!("`{}` is not a non-negative integer", raw));
                }
                let value = value.trim_start_matches('0');
                let value = if value.is_empty() { "0" } else { value };
                if !decimal_le(value, max.trim_start_matches('0')) {
                    return Err(format!("{} exceeds the declared maximum {}", value, max));
                }
                Ok(value.to_string())
            }
            TypeTag::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok("true".to_string()),
                "false" | "0" | "no" => Ok("false".to_string()),
                other => Err(format!("`{}` is not a boolean", other)),
            },
            _ => Ok(raw.to_string()),
        }
    }
}

/// `Uint<16>` with base `Uint` yields `16`.
fn strip_generic<'a>(raw: &'a str, base: &str) -> Option<&'a str> {
    raw.strip_prefix(base)?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')
}

/// Split on commas that are not nested inside `<>`, `[]`, or `()`.
pub(crate) fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Decimal rendering of 2^bits - 1 without a bigint dependency.
pub(crate) fn pow2_minus_one(bits: u32) -> String {
    if bits == 0 {
        return "0".to_string();
    }
    // Little-endian decimal digits of 2^bits, then subtract one. A power of
    // two never ends in zero, so the subtraction touches only the last digit.
    let mut digits: Vec<u8> = vec![1];
    for _ in 0..bits {
        let mut carry = 0;
        for d in digits.iter_mut() {
            let doubled = *d * 2 + carry;
            *d = doubled % 10;
            carry = doubled / 10;
        }
        if carry > 0 {
            digits.push(carry);
        }
    }
    digits[0] -= 1;
    digits.iter().rev().map(|d| (b'0' + d) as char).collect()
}

/// Compare two non-negative decimal strings without leading zeros.
pub(crate) fn decimal_le(a: &str, b: &str) -> bool {
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => a <= b,
    }
}

// ============================================================================
// Operations
// ============================================================================

/// One declared parameter of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_tag: TypeTag,
}

/// One selectable, named action exposed by the wrapped program.
///
/// Immutable once constructed by the analyzer for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeTag,
    /// Heuristic classification, not a proof: an explicit purity flag wins,
    /// otherwise a non-empty declared result implies read-only. The source
    /// data cannot distinguish "has a return value" from "has no side
    /// effects".
    pub read_only: bool,
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        return_type: TypeTag,
        pure: Option<bool>,
    ) -> Self {
        let read_only = pure.unwrap_or(false) || !return_type.is_empty();
        Self {
            name: name.into(),
            parameters,
            return_type,
            read_only,
        }
    }
}

/// Declared module-level state, parsed from source for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDeclaration {
    pub kind: String,
    pub name: String,
    pub type_tag: TypeTag,
}
