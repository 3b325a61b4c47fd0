// src/menu.rs
// Ordered, numbered menu model mirroring the wrapped program's own prompt.
//
// The session scans the *process's echoed* menu text to find the numeric
// index for a target operation; this model must agree with that echo on
// ordering so it is a reliable fallback.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::analyzer::Operation;

/// The literal question the wrapped program prints under its menu
pub const MENU_QUESTION: &str = "Which would you like to do?";

/// Labels of the fixed trailing items, in their fixed order
pub const LEDGER_STATE_LABEL: &str = "Display the current ledger state";
pub const PRIVATE_STATE_LABEL: &str = "Display the current private state";
pub const EXIT_LABEL: &str = "Exit";

const OPERATION_ICON: &str = "▸";
const STATE_ICON: &str = "▤";
const EXIT_ICON: &str = "✕";

/// One selectable line of the menu
#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    /// 1-based index, never reused within a session
    pub index: usize,
    pub label: String,
    pub icon: &'static str,
    pub operation: Option<Operation>,
    pub is_terminal: bool,
}

/// Build the full menu: operations first in analyzer order, then the three
/// fixed trailing items. Total for any operation list, including empty.
pub fn build_menu(operations: &[Operation]) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = operations
        .iter()
        .enumerate()
        .map(|(i, op)| MenuItem {
            index: i + 1,
            label: op.name.clone(),
            icon: OPERATION_ICON,
            operation: Some(op.clone()),
            is_terminal: false,
        })
        .collect();

    let trailing = [
        (LEDGER_STATE_LABEL, STATE_ICON, false),
        (PRIVATE_STATE_LABEL, STATE_ICON, false),
        (EXIT_LABEL, EXIT_ICON, true),
    ];
    for (label, icon, is_terminal) in trailing {
        items.push(MenuItem {
            index: items.len() + 1,
            label: label.to_string(),
            icon,
            operation: None,
            is_terminal,
        });
    }

    items
}

/// Render the menu the way the wrapped program echoes it:
/// `<n>. <icon> <label>` lines followed by the prompt question.
pub fn render_prompt(menu: &[MenuItem]) -> String {
    let mut out = String::new();
    for item in menu {
        out.push_str(&format!("{}. {} {}\n", item.index, item.icon, item.label));
    }
    out.push_str(MENU_QUESTION);
    out.push('\n');
    out
}

/// `<number>. <icon> <label>` with the icon optional
static MENU_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(\d+)\.\s+(.+?)\s*$").expect("menu line pattern is valid"));

/// Scan echoed menu text for the numeric index of a named item.
///
/// Case-insensitive exact match on the label after any icon token. `None`
/// means the caller should select the exit item instead, so the session
/// always makes forward progress.
pub fn resolve_index(captured: &str, name: &str) -> Option<usize> {
    for caps in MENU_LINE_RE.captures_iter(captured) {
        // A line whose leading number does not fit usize is not a menu
        // line; keep scanning.
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        let label = strip_icon(&caps[2]);
        if label.eq_ignore_ascii_case(name.trim()) {
            return Some(index);
        }
    }
    None
}

/// Drop a leading token that carries no alphanumeric character (the icon).
fn strip_icon(rest: &str) -> &str {
    let rest = rest.trim();
    match rest.split_once(char::is_whitespace) {
        Some((first, tail)) if !first.chars().any(|c| c.is_alphanumeric()) => tail.trim(),
        _ => rest,
    }
}
