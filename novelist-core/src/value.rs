use serde::{de::DeserializeOwned, Serialize};

use crate::NovelistError;

pub type Value = serde_json::Value;

/// Insertion-ordered string-keyed mapping of loosely typed values.
pub type ValueMap = serde_json::Map<String, Value>;

pub trait IntoValue {
    fn into_value(self) -> Value;
}

pub trait TryFromValue: Sized {
    fn try_from_value(value: Value) -> Result<Self, NovelistError>;
}

impl<T> IntoValue for T
where
    T: Serialize,
{
    fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl<T> TryFromValue for T
where
    T: DeserializeOwned,
{
    fn try_from_value(value: Value) -> Result<Self, NovelistError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Renders a value the way it should appear inside a prompt: strings without
/// quotes, everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
