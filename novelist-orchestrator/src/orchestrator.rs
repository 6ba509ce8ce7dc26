use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use novelist_core::{
    Checkpointer, ContentValidator, ContextRetriever, GenerationBackend, InMemoryCheckpointer,
    NovelistError, StaticRetriever, StaticSummarizer, Summarizer, Value,
};

use crate::executor::run_sequential;
use crate::stages::{Collaborators, Pipeline};
use crate::state::{META_REFINE_COUNT, META_TASK_ID};
use crate::store::CheckpointStore;
use crate::validator::LlmLogicValidator;
use crate::{AgentState, ExecutionMode, OrchestratorConfig, ProcessRequest};

#[cfg(feature = "graph")]
use novelist_graph::{ExecutableGraph, GraphProgram, GraphState};

/// Drives runs of the five-stage pipeline.
///
/// Collaborators are injected through [`OrchestratorBuilder`]; the
/// orchestrator holds no state across runs other than the checkpoint store.
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    #[cfg(feature = "graph")]
    graph: Option<ExecutableGraph<AgentState>>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        self.pipeline.config()
    }

    /// Whether runs go through the graph engine rather than the sequential
    /// driver.
    pub fn uses_graph(&self) -> bool {
        #[cfg(feature = "graph")]
        {
            self.graph.is_some()
        }
        #[cfg(not(feature = "graph"))]
        {
            false
        }
    }

    #[cfg(feature = "graph")]
    pub fn graph_program(&self) -> Option<GraphProgram> {
        self.graph.as_ref().map(ExecutableGraph::program)
    }

    /// Runs one request to completion. Collaborator failures degrade the
    /// result but never fail the run.
    pub async fn process(&self, request: ProcessRequest) -> AgentState {
        let state = self.prepare(request).await;
        let task_id = state.task_id().unwrap_or("unknown").to_string();
        let span = tracing::info_span!("novelist.run", task_id = %task_id);
        async move {
            tracing::info!(graph = self.uses_graph(), "run started");
            let result = self.execute(state).await;
            tracing::info!(
                refine_count = result.refine_count(),
                passed = ?result.validation_result.as_ref().map(|v| v.passed),
                "run finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Like [`Orchestrator::process`], but abandons the run as soon as
    /// `token` is cancelled. Checkpoints written before cancellation remain
    /// resumable.
    pub async fn process_with_cancellation(
        &self,
        request: ProcessRequest,
        token: CancellationToken,
    ) -> Result<AgentState, NovelistError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::warn!("run cancelled");
                Err(NovelistError::Cancelled)
            }
            state = self.process(request) => Ok(state),
        }
    }

    async fn prepare(&self, request: ProcessRequest) -> AgentState {
        let ProcessRequest {
            user_input,
            resume_from,
            params,
        } = request;

        let resumed = match resume_from.as_deref() {
            Some(id) => {
                let loaded = self.pipeline.store().get(id).await;
                if loaded.is_none() {
                    tracing::warn!(checkpoint_id = %id, "checkpoint not found, starting fresh");
                }
                loaded
            }
            None => None,
        };

        let mut state = match resumed {
            Some(mut state) => {
                if !user_input.is_empty() {
                    state.user_input = user_input;
                }
                if let Some(existing) = params.existing_content.clone() {
                    state.existing_content = Some(existing);
                }
                state.metadata.extend(params.metadata_entries());
                if !state.metadata.contains_key(META_REFINE_COUNT) {
                    state.set_metadata(META_REFINE_COUNT, 0u32);
                }
                state
            }
            None => {
                let mut state = AgentState::new(user_input);
                state.locked_settings = params.locked_settings.clone();
                state.existing_content = params.existing_content.clone();
                state.metadata.extend(params.metadata_entries());
                state
            }
        };

        if state.task_id().is_none() {
            let generated = uuid::Uuid::new_v4().to_string();
            state
                .metadata
                .insert(META_TASK_ID.to_string(), Value::String(generated));
        }
        state
    }

    async fn execute(&self, state: AgentState) -> AgentState {
        #[cfg(feature = "graph")]
        {
            if let Some(graph) = &self.graph {
                match graph.invoke(GraphState::new(state.clone())).await {
                    Ok(finished) => return finished.into_inner(),
                    Err(err) => {
                        tracing::error!(error = %err, "graph engine failed, re-running sequentially");
                    }
                }
            }
        }
        run_sequential(&self.pipeline, state).await
    }
}

pub struct OrchestratorBuilder {
    backend: Option<Arc<dyn GenerationBackend>>,
    retriever: Option<Arc<dyn ContextRetriever>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    validator: Option<Arc<dyn ContentValidator>>,
    checkpointer: Option<Arc<dyn Checkpointer<AgentState>>>,
    config: OrchestratorConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            backend: None,
            retriever: None,
            summarizer: None,
            validator: None,
            checkpointer: None,
            config: OrchestratorConfig::default(),
        }
    }
}

impl OrchestratorBuilder {
    pub fn backend<B: GenerationBackend>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn retriever<R: ContextRetriever>(mut self, retriever: R) -> Self {
        self.retriever = Some(Arc::new(retriever));
        self
    }

    pub fn summarizer<S: Summarizer>(mut self, summarizer: S) -> Self {
        self.summarizer = Some(Arc::new(summarizer));
        self
    }

    /// Defaults to an [`LlmLogicValidator`] over the generation backend.
    pub fn validator<V: ContentValidator>(mut self, validator: V) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Defaults to an [`InMemoryCheckpointer`].
    pub fn checkpointer<C>(mut self, checkpointer: C) -> Self
    where
        C: Checkpointer<AgentState> + 'static,
    {
        self.checkpointer = Some(Arc::new(checkpointer));
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Orchestrator, NovelistError> {
        self.config.validate()?;
        let backend = self.backend.ok_or_else(|| {
            NovelistError::InvalidConfig("a generation backend is required".to_string())
        })?;
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(LlmLogicValidator::new(Arc::clone(&backend))));
        let collaborators = Collaborators {
            backend,
            retriever: self
                .retriever
                .unwrap_or_else(|| Arc::new(StaticRetriever::default())),
            summarizer: self
                .summarizer
                .unwrap_or_else(|| Arc::new(StaticSummarizer::default())),
            validator,
        };
        let store = CheckpointStore::from_arc(
            self.checkpointer
                .unwrap_or_else(|| Arc::new(InMemoryCheckpointer::<AgentState>::default())),
        );
        let pipeline = Arc::new(Pipeline::new(collaborators, store, self.config));

        #[cfg(feature = "graph")]
        let graph = match pipeline.config().execution {
            ExecutionMode::Sequential => None,
            ExecutionMode::Graph => match crate::graph_executor::build_stage_graph(Arc::clone(&pipeline)) {
                Ok(graph) => Some(graph),
                Err(err) => {
                    tracing::warn!(error = %err, "graph engine unavailable, using sequential driver");
                    None
                }
            },
        };
        #[cfg(not(feature = "graph"))]
        {
            if pipeline.config().execution == ExecutionMode::Graph {
                tracing::warn!("built without the graph engine, using sequential driver");
            }
        }

        Ok(Orchestrator {
            pipeline,
            #[cfg(feature = "graph")]
            graph,
        })
    }
}
