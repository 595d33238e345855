//! Parser/writer for the `{key: value, ...}` object literal used by
//! `BattleSetup.stat_boosts` and `BattleSetup.pokemon_data`.
//!
//! The wire codec never looks inside these strings; this module is where
//! they actually get interpreted, one level up, by the model types that
//! know the field set.

use crate::error::ModelError;
use std::collections::HashMap;

/// Parse a `{key: value, key2: value2}` literal into its entries, in order.
///
/// Trailing/leading whitespace around keys and values is trimmed. Does not
/// support nesting or quoted values — the schema never needs them.
pub fn parse(literal: &str) -> Result<HashMap<String, String>, ModelError> {
    let trimmed = literal.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| ModelError::NotAnObjectLiteral(literal.to_owned()))?;

    let mut fields = HashMap::new();
    if inner.trim().is_empty() {
        return Ok(fields);
    }
    for entry in inner.split(',') {
        let (key, value) = entry
            .split_once(':')
            .ok_or_else(|| ModelError::NotAnObjectLiteral(literal.to_owned()))?;
        fields.insert(key.trim().to_owned(), value.trim().to_owned());
    }
    Ok(fields)
}

/// Render `entries` back into the `{key: value, ...}` literal form, in the
/// order given (callers pass a fixed field order so output is deterministic
/// across peers, matching the wire codec's own determinism requirement).
pub fn render(entries: &[(&str, String)]) -> String {
    let body = entries
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}
