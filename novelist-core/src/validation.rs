use serde::{Deserialize, Serialize};

use crate::value::display_value;
use crate::{NovelistError, Value, ValueMap};

pub const EMPTY_CONTENT_ISSUE: &str = "content empty";

/// Verdict of a content check. Always normalized: `issues` and `suggestions`
/// are plain strings, never null.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            issues: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn fail<I, T>(issues: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            passed: false,
            issues: issues.into_iter().map(Into::into).collect(),
            suggestions: Vec::new(),
        }
    }

    pub fn empty_content() -> Self {
        Self::fail([EMPTY_CONTENT_ISSUE])
    }

    /// Normalizes an untrusted verdict.
    ///
    /// `passed` accepts booleans and the strings `"true"`/`"false"`; when it is
    /// missing or unreadable the verdict passes iff there are no issues.
    /// `issues`/`suggestions` accept a list or a single string; other entries
    /// are stringified.
    pub fn from_value(value: &Value) -> Self {
        let issues = string_list(value.get("issues"));
        let suggestions = string_list(value.get("suggestions"));
        let passed = match value.get("passed") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "pass" | "passed" => true,
                "false" | "no" | "fail" | "failed" => false,
                _ => issues.is_empty(),
            },
            _ => issues.is_empty(),
        };
        Self {
            passed,
            issues,
            suggestions,
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(display_value)
            .filter(|item| !item.trim().is_empty())
            .collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text.clone()],
        _ => Vec::new(),
    }
}

/// Checks generated content against retrieved knowledge and locked settings.
#[async_trait::async_trait]
pub trait ContentValidator: Send + Sync + 'static {
    async fn validate(
        &self,
        content: &str,
        core_knowledge: &[String],
        locked_settings: &ValueMap,
    ) -> Result<ValidationResult, NovelistError>;
}
