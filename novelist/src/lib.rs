//! Resumable LLM orchestration for long-form fiction writing.
//!
//! ```no_run
//! use novelist::{Orchestrator, ProcessRequest, RunParameters};
//! use novelist::llm::OllamaClient;
//!
//! # async fn run() -> Result<(), novelist::NovelistError> {
//! let backend = OllamaClient::new("http://localhost:11434".into(), "qwen2.5".into())?;
//! let orchestrator = Orchestrator::builder().backend(backend).build()?;
//! let state = orchestrator
//!     .process(
//!         ProcessRequest::new("写一段打斗场景").with_params(
//!             RunParameters::default()
//!                 .with_task_id("chapter-12")
//!                 .with_locked_setting("主角绝招", "烈焰斩"),
//!         ),
//!     )
//!     .await;
//! println!("{}", state.output);
//! # Ok(())
//! # }
//! ```

pub use novelist_core as core;
pub use novelist_core::{
    Checkpointer, FileCheckpointer, GenerationBackend, GenerationRequest, InMemoryCheckpointer,
    NovelistError, RetryingBackend, ValidationResult,
};
pub use novelist_orchestrator::{
    AgentState, CancellationToken, ExecutionMode, Orchestrator, OrchestratorConfig,
    ProcessRequest, RunParameters, TaskType,
};
pub use novelist_prompt as prompt;

pub mod orchestrator {
    pub use novelist_orchestrator::*;
}

#[cfg(feature = "graph")]
pub mod graph {
    pub use novelist_graph::*;
}

#[cfg(feature = "llm")]
pub mod llm {
    pub use novelist_llm::*;
}
