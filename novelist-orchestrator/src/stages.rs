use std::sync::Arc;

use novelist_core::{
    parse_json_or, ContentValidator, ContextRetriever, GenerationBackend, GenerationRequest,
    Summarizer, ValidationResult, Value, ValueMap,
};

use crate::prompts::{self, SYSTEM_MESSAGE};
use crate::state::{META_MAX_TOKENS, META_REFINE_COUNT, META_TEMPERATURE, RESERVED_METADATA_KEYS};
use crate::store::{checkpoint_id, CheckpointStore};
use crate::{AgentState, OrchestratorConfig, TaskType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Understand,
    Retrieve,
    Generate,
    Validate,
    Refine,
}

impl Stage {
    /// Stages every run executes once, in order, before the refine loop.
    pub const FORWARD: [Stage; 4] = [
        Stage::Understand,
        Stage::Retrieve,
        Stage::Generate,
        Stage::Validate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Understand => "understand",
            Stage::Retrieve => "retrieve_context",
            Stage::Generate => "generate",
            Stage::Validate => "validate",
            Stage::Refine => "refine",
        }
    }

    pub fn checkpoint_label(self) -> &'static str {
        match self {
            Stage::Understand => "intent_understood",
            Stage::Retrieve => "context_retrieved",
            Stage::Generate => "content_generated",
            Stage::Validate => "output_validated",
            Stage::Refine => "output_refined",
        }
    }

    /// Position of this stage within a run, derived from the state it
    /// produced so both drivers number checkpoints identically.
    fn step(self, produced: &AgentState) -> u64 {
        let refines = u64::from(produced.refine_count());
        match self {
            Stage::Understand => 1,
            Stage::Retrieve => 2,
            Stage::Generate => 3,
            Stage::Validate => 4 + 2 * refines,
            Stage::Refine => 3 + 2 * refines,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefineDecision {
    Refine,
    Finish,
}

/// Refine only after a failed verdict, and only while the budget lasts.
pub fn should_refine(state: &AgentState, max_refinements: u32) -> RefineDecision {
    match &state.validation_result {
        Some(result) if !result.passed && state.refine_count() < max_refinements => {
            RefineDecision::Refine
        }
        _ => RefineDecision::Finish,
    }
}

/// Collaborator handles shared by every stage.
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn GenerationBackend>,
    pub retriever: Arc<dyn ContextRetriever>,
    pub summarizer: Arc<dyn Summarizer>,
    pub validator: Arc<dyn ContentValidator>,
}

/// The five stage functions plus checkpointing. Stages never fail: every
/// collaborator error is replaced by a safe default and recorded in
/// `messages`.
#[derive(Clone)]
pub struct Pipeline {
    collaborators: Collaborators,
    store: CheckpointStore,
    config: OrchestratorConfig,
}

impl Pipeline {
    pub fn new(
        collaborators: Collaborators,
        store: CheckpointStore,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            collaborators,
            store,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn decide(&self, state: &AgentState) -> RefineDecision {
        should_refine(state, self.config.max_refinements)
    }

    /// Runs one stage and checkpoints the state it produced.
    pub async fn run_stage(&self, stage: Stage, state: AgentState) -> AgentState {
        tracing::info!(stage = stage.name(), "stage started");
        let next = match stage {
            Stage::Understand => self.understand(state).await,
            Stage::Retrieve => self.retrieve(state).await,
            Stage::Generate => self.generate(state).await,
            Stage::Validate => self.validate(state).await,
            Stage::Refine => self.refine(state).await,
        };
        let task_id = next.task_id().unwrap_or("unknown").to_string();
        self.store
            .put(&checkpoint_id(&task_id, stage), stage.step(&next), stage, &next)
            .await;
        next
    }

    pub async fn understand(&self, mut state: AgentState) -> AgentState {
        let answer = match prompts::intent_prompt(&state.user_input) {
            Ok(prompt) => {
                self.collaborators
                    .backend
                    .generate(GenerationRequest::new(prompt))
                    .await
            }
            Err(err) => Err(err),
        };

        match answer {
            Ok(raw) => {
                let fields: ValueMap =
                    parse_json_or(&raw, "intent classification", ValueMap::new());
                state.task_type = fields
                    .get("task_type")
                    .and_then(Value::as_str)
                    .map(TaskType::from_label)
                    .unwrap_or_default();
                for (key, value) in fields {
                    if !RESERVED_METADATA_KEYS.contains(&key.as_str()) {
                        state.metadata.insert(key, value);
                    }
                }
                state.record(format!("intent: {}", state.task_type));
            }
            Err(err) => {
                tracing::error!(error = %err, transient = err.is_transient(), "intent recognition failed");
                state.task_type = TaskType::Generate;
                state.record(format!("intent recognition failed: {err}"));
            }
        }
        tracing::info!(task_type = %state.task_type, "intent understood");
        state
    }

    pub async fn retrieve(&self, mut state: AgentState) -> AgentState {
        match self
            .collaborators
            .retriever
            .retrieve_context(&state.user_input, self.config.retrieval_top_k)
            .await
        {
            Ok(knowledge) => state.core_knowledge = knowledge,
            Err(err) => {
                tracing::error!(error = %err, "context retrieval failed");
                state.core_knowledge = Vec::new();
                state.record(format!("context retrieval failed: {err}"));
            }
        }

        if state.task_type.wants_summaries() {
            state.summaries = match self
                .collaborators
                .summarizer
                .recent_summaries(self.config.summary_count)
                .await
            {
                Ok(summaries) => summaries
                    .into_iter()
                    .enumerate()
                    .map(|(idx, summary)| (format!("chapter_{idx}"), Value::String(summary)))
                    .collect(),
                Err(err) => {
                    tracing::warn!(error = %err, "summary lookup failed");
                    Default::default()
                }
            };
        }

        let count = state.core_knowledge.len();
        state.record(format!("retrieved {count} core knowledge entries"));
        tracing::info!(count, "context retrieved");
        state
    }

    pub async fn generate(&self, mut state: AgentState) -> AgentState {
        let temperature = state
            .metadata_as::<f32>(META_TEMPERATURE)
            .unwrap_or(self.config.default_temperature);
        let max_tokens = state
            .metadata_as::<u32>(META_MAX_TOKENS)
            .unwrap_or(self.config.default_max_tokens);

        let result = match prompts::generation_prompt(&state) {
            Ok(prompt) => {
                let request = GenerationRequest::new(prompt)
                    .with_system_message(SYSTEM_MESSAGE)
                    .with_temperature(temperature)
                    .with_max_tokens(max_tokens);
                self.collaborators.backend.generate(request).await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(output) => {
                let chars = output.chars().count();
                state.output = output;
                state.record(format!("generated {chars} characters"));
                tracing::info!(chars, task_type = %state.task_type, "content generated");
            }
            Err(err) => {
                tracing::error!(error = %err, transient = err.is_transient(), "content generation failed");
                state.output = String::new();
                state.record(format!("generation failed: {err}"));
            }
        }
        state
    }

    pub async fn validate(&self, mut state: AgentState) -> AgentState {
        if state.output.trim().is_empty() {
            state.validation_result = Some(ValidationResult::empty_content());
            state.record("validation failed: content empty");
            return state;
        }

        let verdict = self
            .collaborators
            .validator
            .validate(&state.output, &state.core_knowledge, &state.locked_settings)
            .await;
        let result = match verdict {
            Ok(result) => {
                state.record(if result.passed {
                    "validation passed".to_string()
                } else {
                    format!("validation failed: {} issue(s)", result.issues.len())
                });
                result
            }
            Err(err) => {
                tracing::error!(error = %err, "validator unavailable, accepting output");
                state.record(format!("validator unavailable, accepting output: {err}"));
                ValidationResult::pass()
            }
        };
        tracing::info!(passed = result.passed, issues = result.issues.len(), "output validated");
        state.validation_result = Some(result);
        state
    }

    pub async fn refine(&self, mut state: AgentState) -> AgentState {
        let issues = state
            .validation_result
            .as_ref()
            .map(|result| result.issues.clone())
            .unwrap_or_default();
        let temperature = state
            .metadata_as::<f32>(META_TEMPERATURE)
            .unwrap_or(self.config.default_temperature);
        let max_tokens = state
            .metadata_as::<u32>(META_MAX_TOKENS)
            .unwrap_or(self.config.default_max_tokens);

        let result = match prompts::refine_prompt(&state, &issues) {
            Ok(prompt) => {
                let request = GenerationRequest::new(prompt)
                    .with_system_message(SYSTEM_MESSAGE)
                    .with_temperature(temperature)
                    .with_max_tokens(max_tokens);
                self.collaborators.backend.generate(request).await
            }
            Err(err) => Err(err),
        };

        // A failed attempt still consumes the refine budget.
        let attempt = state.refine_count() + 1;
        state.set_metadata(META_REFINE_COUNT, attempt);
        match result {
            Ok(refined) => {
                state.output = refined;
                state.record(format!("content refined (attempt {attempt})"));
                tracing::info!(attempt, "content refined");
            }
            Err(err) => {
                tracing::error!(attempt, error = %err, "refine failed, keeping previous draft");
                state.record(format!("refine failed (attempt {attempt}): {err}"));
            }
        }
        state
    }
}
