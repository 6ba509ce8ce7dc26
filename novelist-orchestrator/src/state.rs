use std::fmt;

use serde::{Deserialize, Serialize};

use novelist_core::{IntoValue, StateSchema, TryFromValue, ValidationResult, ValueMap};

pub const META_REFINE_COUNT: &str = "refine_count";
pub const META_TASK_ID: &str = "task_id";
pub const META_TEMPERATURE: &str = "temperature";
pub const META_MAX_TOKENS: &str = "max_tokens";

/// Run-control keys that structured LLM answers may not overwrite.
pub const RESERVED_METADATA_KEYS: [&str; 4] = [
    META_REFINE_COUNT,
    META_TASK_ID,
    META_TEMPERATURE,
    META_MAX_TOKENS,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    #[default]
    Generate,
    Continue,
    Summarize,
    Check,
    Edit,
    Outline,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::Generate,
        TaskType::Continue,
        TaskType::Summarize,
        TaskType::Check,
        TaskType::Edit,
        TaskType::Outline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Generate => "generate",
            TaskType::Continue => "continue",
            TaskType::Summarize => "summarize",
            TaskType::Check => "check",
            TaskType::Edit => "edit",
            TaskType::Outline => "outline",
        }
    }

    /// Labels outside the taxonomy fall back to [`TaskType::Generate`].
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|task| task.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }

    /// Tasks whose prompts draw on recent chapter summaries.
    pub fn wants_summaries(self) -> bool {
        matches!(self, TaskType::Generate | TaskType::Continue)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record threaded through every stage of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentState {
    pub user_input: String,
    pub task_type: TaskType,
    pub context: Vec<String>,
    pub core_knowledge: Vec<String>,
    /// `chapter_N` -> summary, most recent chapter first.
    pub summaries: ValueMap,
    pub output: String,
    pub locked_settings: ValueMap,
    pub validation_result: Option<ValidationResult>,
    pub metadata: ValueMap,
    pub messages: Vec<String>,
    pub existing_content: Option<String>,
}

impl AgentState {
    pub fn new(user_input: impl Into<String>) -> Self {
        let mut state = Self {
            user_input: user_input.into(),
            ..Self::default()
        };
        state.set_metadata(META_REFINE_COUNT, 0u32);
        state
    }

    pub fn metadata_as<T: TryFromValue>(&self, key: &str) -> Option<T> {
        self.metadata
            .get(key)
            .cloned()
            .and_then(|value| T::try_from_value(value).ok())
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl IntoValue) {
        self.metadata.insert(key.into(), value.into_value());
    }

    pub fn refine_count(&self) -> u32 {
        self.metadata_as(META_REFINE_COUNT).unwrap_or(0)
    }

    pub fn task_id(&self) -> Option<&str> {
        self.metadata
            .get(META_TASK_ID)
            .and_then(|value| value.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn record(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// The continuation template applies only when there is prose to continue.
    pub fn continues_existing(&self) -> bool {
        self.task_type == TaskType::Continue
            && self
                .existing_content
                .as_deref()
                .is_some_and(|content| !content.trim().is_empty())
    }
}

impl StateSchema for AgentState {
    type Update = AgentState;

    fn apply(_current: &Self, update: AgentState) -> Self {
        update
    }
}
