//! Tolerant parsing of agent-supplied tool arguments.
//!
//! Tool arguments originate from an external agent and arrive as
//! semi-structured text (JSON fragments, delimited lists, `name:label:...`
//! descriptors). Every function here is pure and total: malformed input
//! degrades to a best-effort result, never an error.

use serde_json::{Map, Value};

/// A single input field parsed from a pipe-delimited descriptor string.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldDefinition {
    /// Key the submitted value is reported under.
    pub name: String,
    /// Human-readable label, defaulting to the field name.
    pub label: String,
    /// Placeholder text shown in the empty input.
    pub placeholder: String,
    /// Input type (`"text"`, `"email"`, `"textarea"`, ...), lowercased.
    pub field_type: String,
}

/// Strips one layer of surrounding `[...]` and one layer of a matching
/// quote pair from a choice token.
fn clean_choice(choice: &str) -> String {
    let mut cleaned = choice.trim();
    if cleaned.starts_with('[') {
        cleaned = cleaned[1..].trim();
    }
    if cleaned.ends_with(']') {
        cleaned = cleaned[..cleaned.len() - 1].trim();
    }
    if (cleaned.starts_with('"') && cleaned.ends_with('"'))
        || (cleaned.starts_with('\'') && cleaned.ends_with('\''))
    {
        cleaned = if cleaned.len() >= 2 {
            cleaned[1..cleaned.len() - 1].trim()
        } else {
            ""
        };
    }
    cleaned.to_string()
}

fn choice_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses a raw `choices` argument into a list of selectable options.
///
/// A JSON array is honored first; otherwise delimiters are tried in priority
/// order: newline, `|`, `,`. Each token is cleaned via [`clean_choice`] and
/// empty tokens are dropped. A delimiter-free input yields itself as the
/// single choice.
pub fn parse_choice_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(trimmed) {
        return entries
            .iter()
            .map(|entry| clean_choice(&choice_text(entry)))
            .filter(|c| !c.is_empty())
            .collect();
    }

    if trimmed.contains('\n') {
        return trimmed
            .split('\n')
            .map(|c| clean_choice(c.trim_end_matches('\r')))
            .filter(|c| !c.is_empty())
            .collect();
    }

    if trimmed.contains('|') {
        return trimmed
            .split('|')
            .map(clean_choice)
            .filter(|c| !c.is_empty())
            .collect();
    }

    if trimmed.contains(',') {
        return trimmed
            .split(',')
            .map(clean_choice)
            .filter(|c| !c.is_empty())
            .collect();
    }

    let single = clean_choice(trimmed);
    if single.is_empty() {
        Vec::new()
    } else {
        vec![single]
    }
}

/// Parses a pipe-delimited `fields` argument into field definitions.
///
/// Each segment is split on `:` into up to four ordered parts
/// (`name:label:placeholder:type`); extra parts are discarded. Label
/// defaults to the name, type to `"text"`. Segments with an empty name are
/// dropped.
pub fn parse_field_definitions(raw: &str) -> Vec<FieldDefinition> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    raw.split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let parts: Vec<&str> = segment.split(':').collect();
            let name = parts.first().copied().unwrap_or_default();
            if name.is_empty() {
                return None;
            }
            let label = parts.get(1).copied().filter(|l| !l.is_empty()).unwrap_or(name);
            let placeholder = parts.get(2).copied().unwrap_or_default();
            let field_type = parts
                .get(3)
                .copied()
                .filter(|t| !t.is_empty())
                .unwrap_or("text");
            Some(FieldDefinition {
                name: name.to_string(),
                label: label.to_string(),
                placeholder: placeholder.to_string(),
                field_type: field_type.to_lowercase(),
            })
        })
        .collect()
}

/// Looks up an argument by key and coerces it to display text.
///
/// Missing and null values map to the empty string; strings pass through;
/// any other JSON value is stringified compactly.
pub fn arg_str(args: &Map<String, Value>, key: &str) -> String {
    match args.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Returns the first candidate key whose value is a non-blank string.
pub fn first_arg_str(args: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match args.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Converts an arbitrary result value to preformatted display text.
///
/// Strings pass through; arrays join their elements with newlines, pretty
/// printing anything that is not already a string; other structures are
/// pretty printed; null yields the empty string.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| match entry {
                Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}
