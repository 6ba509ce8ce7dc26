use serde::{Deserialize, Serialize};

use novelist_core::{IntoValue, Value, ValueMap};

use crate::state::{META_MAX_TOKENS, META_REFINE_COUNT, META_TASK_ID, META_TEMPERATURE};

/// Caller-supplied parameters for one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParameters {
    pub locked_settings: ValueMap,
    pub existing_content: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Namespaces checkpoint identifiers; generated when absent.
    pub task_id: Option<String>,
    /// Free-form entries copied into `metadata`.
    #[serde(flatten)]
    pub extra: ValueMap,
}

impl RunParameters {
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_locked_setting(mut self, key: impl Into<String>, value: impl IntoValue) -> Self {
        self.locked_settings.insert(key.into(), value.into_value());
        self
    }

    pub fn with_existing_content(mut self, content: impl Into<String>) -> Self {
        self.existing_content = Some(content.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl IntoValue) -> Self {
        self.extra.insert(key.into(), value.into_value());
        self
    }

    /// Entries merged into `metadata`. `refine_count` is owned by the run
    /// and never taken from the caller.
    pub(crate) fn metadata_entries(&self) -> ValueMap {
        let mut entries: ValueMap = self
            .extra
            .iter()
            .filter(|(key, _)| key.as_str() != META_REFINE_COUNT)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(temperature) = self.temperature {
            entries.insert(META_TEMPERATURE.to_string(), temperature.into_value());
        }
        if let Some(max_tokens) = self.max_tokens {
            entries.insert(META_MAX_TOKENS.to_string(), Value::from(max_tokens));
        }
        if let Some(task_id) = self.task_id.as_deref().filter(|id| !id.is_empty()) {
            entries.insert(META_TASK_ID.to_string(), Value::from(task_id));
        }
        entries
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub user_input: String,
    #[serde(default)]
    pub resume_from: Option<String>,
    #[serde(default)]
    pub params: RunParameters,
}

impl ProcessRequest {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            ..Self::default()
        }
    }

    pub fn resume_from(mut self, checkpoint_id: impl Into<String>) -> Self {
        self.resume_from = Some(checkpoint_id.into());
        self
    }

    pub fn with_params(mut self, params: RunParameters) -> Self {
        self.params = params;
        self
    }
}
