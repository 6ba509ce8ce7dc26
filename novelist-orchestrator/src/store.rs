use std::sync::Arc;

use novelist_core::{Checkpoint, Checkpointer};

use crate::{AgentState, Stage};

/// `"{task_id}_{label}"`, e.g. `book-1_content_generated`.
pub fn checkpoint_id(task_id: &str, stage: Stage) -> String {
    format!("{task_id}_{}", stage.checkpoint_label())
}

/// Best-effort checkpoint persistence. Failures are logged, never returned.
#[derive(Clone)]
pub struct CheckpointStore {
    inner: Arc<dyn Checkpointer<AgentState>>,
}

impl CheckpointStore {
    pub fn new<C>(checkpointer: C) -> Self
    where
        C: Checkpointer<AgentState> + 'static,
    {
        Self {
            inner: Arc::new(checkpointer),
        }
    }

    pub fn from_arc(checkpointer: Arc<dyn Checkpointer<AgentState>>) -> Self {
        Self {
            inner: checkpointer,
        }
    }

    pub async fn put(&self, id: &str, step: u64, stage: Stage, state: &AgentState) {
        let checkpoint = Checkpoint::new(id, state.clone(), step, stage.name());
        match self.inner.save(&checkpoint).await {
            Ok(()) => tracing::debug!(checkpoint_id = %id, step, "checkpoint saved"),
            Err(err) => {
                tracing::error!(checkpoint_id = %id, error = %err, "failed to save checkpoint")
            }
        }
    }

    /// Missing, unreadable and incompatible checkpoints all read as `None`.
    pub async fn get(&self, id: &str) -> Option<AgentState> {
        let checkpoint = match self.inner.load(id).await {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => {
                tracing::warn!(checkpoint_id = %id, "checkpoint not found");
                return None;
            }
            Err(err) => {
                tracing::warn!(checkpoint_id = %id, error = %err, "failed to load checkpoint");
                return None;
            }
        };
        if let Err(err) = checkpoint.ensure_compatible() {
            tracing::warn!(checkpoint_id = %id, error = %err, "ignoring incompatible checkpoint");
            return None;
        }
        tracing::info!(checkpoint_id = %id, node = %checkpoint.node, "checkpoint loaded");
        Some(checkpoint.state)
    }
}
