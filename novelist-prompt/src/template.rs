use std::collections::HashMap;

use regex::Regex;
use novelist_core::{display_value, NovelistError, Value, ValueMap};

/// Placeholder rendered for an empty list or mapping ("none").
pub const EMPTY_SENTINEL: &str = "无";

/// `{{name}}`-style template. Unknown placeholders render as empty strings;
/// substituted values are never re-scanned for placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, vars: &HashMap<&str, String>) -> Result<String, NovelistError> {
        let pattern = Regex::new(r"\{\{\s*(\w+)\s*\}\}")
            .map_err(|e| NovelistError::InvalidConfig(e.to_string()))?;
        let rendered = pattern.replace_all(&self.template, |caps: &regex::Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    /// Names of the placeholders in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let Ok(pattern) = Regex::new(r"\{\{\s*(\w+)\s*\}\}") else {
            return Vec::new();
        };
        let mut names: Vec<String> = Vec::new();
        for caps in pattern.captures_iter(&self.template) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// One `- item` line per entry, or [`EMPTY_SENTINEL`] when empty.
pub fn format_bullets<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let lines: Vec<String> = items
        .into_iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect();
    if lines.is_empty() {
        EMPTY_SENTINEL.to_string()
    } else {
        lines.join("\n")
    }
}

/// One `- key: value` line per entry in insertion order, or
/// [`EMPTY_SENTINEL`] when empty.
pub fn format_entries(map: &ValueMap) -> String {
    format_bullets(
        map.iter()
            .map(|(key, value): (&String, &Value)| format!("{key}: {}", display_value(value))),
    )
}
