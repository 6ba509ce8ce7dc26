#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use novelist_core::{
    Checkpoint, Checkpointer, ContentValidator, ContextRetriever, GenerationBackend,
    GenerationRequest, NovelistError, ValidationResult, ValueMap,
};
use novelist_orchestrator::{AgentState, ExecutionMode};

pub const MODES: [ExecutionMode; 2] = [ExecutionMode::Graph, ExecutionMode::Sequential];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Intent,
    Generate,
    Continue,
    Refine,
    Validate,
}

pub fn kind_of(prompt: &str) -> PromptKind {
    if prompt.starts_with("分析用户指令") {
        PromptKind::Intent
    } else if prompt.starts_with("请续写") {
        PromptKind::Continue
    } else if prompt.starts_with("以下内容存在问题") {
        PromptKind::Refine
    } else if prompt.starts_with("请作为一名严谨") {
        PromptKind::Validate
    } else {
        PromptKind::Generate
    }
}

/// Deterministic backend that answers by prompt kind and records every
/// request it receives.
#[derive(Clone)]
pub struct StubBackend {
    intent: String,
    draft: Option<String>,
    refined: Option<String>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl StubBackend {
    pub fn new(draft: &str) -> Self {
        Self {
            intent: r#"{"task_type": "generate", "target": "scene"}"#.to_string(),
            draft: Some(draft.to_string()),
            refined: Some(format!("{draft}（修订）")),
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_intent(mut self, intent: &str) -> Self {
        self.intent = intent.to_string();
        self
    }

    pub fn with_refined(mut self, refined: &str) -> Self {
        self.refined = Some(refined.to_string());
        self
    }

    pub fn failing_generation(mut self) -> Self {
        self.draft = None;
        self
    }

    pub fn failing_refine(mut self) -> Self {
        self.refined = None;
        self
    }

    /// Generation (not intent) requests sleep for `delay` first.
    pub fn with_generation_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_of(&self, kind: PromptKind) -> Vec<GenerationRequest> {
        self.requests()
            .into_iter()
            .filter(|request| kind_of(&request.prompt) == kind)
            .collect()
    }
}

#[async_trait::async_trait]
impl GenerationBackend for StubBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<String, NovelistError> {
        let kind = kind_of(&request.prompt);
        self.requests.lock().unwrap().push(request);
        match kind {
            PromptKind::Intent => Ok(self.intent.clone()),
            PromptKind::Generate | PromptKind::Continue => {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.draft
                    .clone()
                    .ok_or_else(|| NovelistError::LlmProvider("backend offline".to_string()))
            }
            PromptKind::Refine => self
                .refined
                .clone()
                .ok_or_else(|| NovelistError::LlmProvider("backend offline".to_string())),
            PromptKind::Validate => Ok(r#"{"passed": true, "issues": []}"#.to_string()),
        }
    }
}

/// Returns queued verdicts in order, then repeats the last one.
#[derive(Clone)]
pub struct SequenceValidator {
    verdicts: Arc<Mutex<VecDeque<ValidationResult>>>,
    last: ValidationResult,
    calls: Arc<Mutex<usize>>,
}

impl SequenceValidator {
    pub fn new(verdicts: Vec<ValidationResult>) -> Self {
        let last = verdicts.last().cloned().unwrap_or_else(ValidationResult::pass);
        Self {
            verdicts: Arc::new(Mutex::new(verdicts.into())),
            last,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn always(verdict: ValidationResult) -> Self {
        Self::new(vec![verdict])
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl ContentValidator for SequenceValidator {
    async fn validate(
        &self,
        _content: &str,
        _core_knowledge: &[String],
        _locked_settings: &ValueMap,
    ) -> Result<ValidationResult, NovelistError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.verdicts.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.last.clone()))
    }
}

pub struct BrokenValidator;

#[async_trait::async_trait]
impl ContentValidator for BrokenValidator {
    async fn validate(
        &self,
        _content: &str,
        _core_knowledge: &[String],
        _locked_settings: &ValueMap,
    ) -> Result<ValidationResult, NovelistError> {
        Err(NovelistError::Validation("validator timed out".to_string()))
    }
}

pub struct BrokenRetriever;

#[async_trait::async_trait]
impl ContextRetriever for BrokenRetriever {
    async fn retrieve_context(
        &self,
        _query: &str,
        _top_k: usize,
    ) -> Result<Vec<String>, NovelistError> {
        Err(NovelistError::Retrieval("index unavailable".to_string()))
    }
}

pub struct ReadOnlyCheckpointer;

#[async_trait::async_trait]
impl Checkpointer<AgentState> for ReadOnlyCheckpointer {
    async fn save(&self, _checkpoint: &Checkpoint<AgentState>) -> Result<(), NovelistError> {
        Err(NovelistError::CheckpointFailed("disk full".to_string()))
    }

    async fn load(&self, _id: &str) -> Result<Option<Checkpoint<AgentState>>, NovelistError> {
        Ok(None)
    }
}
