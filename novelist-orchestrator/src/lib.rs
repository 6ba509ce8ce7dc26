//! Resumable five-stage orchestration for long-form fiction generation.
//!
//! A run moves an [`AgentState`] through understand, retrieve, generate and
//! validate, then alternates refine and validate until the verdict passes or
//! the refinement budget is spent. The state is checkpointed after every
//! stage under `"{task_id}_{label}"` and a later run can resume from any of
//! those checkpoints.

mod config;
mod executor;
#[cfg(feature = "graph")]
mod graph_executor;
mod orchestrator;
mod request;
mod stages;
mod state;
mod store;
mod validator;

pub mod prompts;

pub use config::{ExecutionMode, OrchestratorConfig};
pub use executor::run_sequential;
#[cfg(feature = "graph")]
pub use graph_executor::build_stage_graph;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use request::{ProcessRequest, RunParameters};
pub use stages::{should_refine, Collaborators, Pipeline, RefineDecision, Stage};
pub use state::{
    AgentState, TaskType, META_MAX_TOKENS, META_REFINE_COUNT, META_TASK_ID, META_TEMPERATURE,
    RESERVED_METADATA_KEYS,
};
pub use store::{checkpoint_id, CheckpointStore};
pub use validator::LlmLogicValidator;

pub use tokio_util::sync::CancellationToken;
