use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::state::StateSchema;
use crate::NovelistError;

/// Durable snapshot of a state, addressed by an opaque identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct Checkpoint<S: StateSchema> {
    pub id: String,
    pub schema_version: u32,
    pub step: u64,
    pub node: String,
    pub created_at: String,
    pub state: S,
}

impl<S: StateSchema> Checkpoint<S> {
    pub fn new(id: impl Into<String>, state: S, step: u64, node: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema_version: S::SCHEMA_VERSION,
            step,
            node: node.into(),
            created_at: Utc::now().to_rfc3339(),
            state,
        }
    }

    pub fn ensure_compatible(&self) -> Result<(), NovelistError> {
        if self.schema_version == S::SCHEMA_VERSION {
            Ok(())
        } else {
            Err(NovelistError::IncompatibleCheckpoint {
                found: self.schema_version,
                expected: S::SCHEMA_VERSION,
            })
        }
    }
}

/// Key/blob persistence for checkpoints. Writes to distinct identifiers must
/// be safe to issue concurrently; the latest write for an identifier wins.
#[async_trait::async_trait]
pub trait Checkpointer<S: StateSchema>: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), NovelistError>;
    async fn load(&self, id: &str) -> Result<Option<Checkpoint<S>>, NovelistError>;
}

#[async_trait::async_trait]
impl<S, C> Checkpointer<S> for Arc<C>
where
    S: StateSchema,
    C: Checkpointer<S> + ?Sized,
{
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), NovelistError> {
        (**self).save(checkpoint).await
    }

    async fn load(&self, id: &str) -> Result<Option<Checkpoint<S>>, NovelistError> {
        (**self).load(id).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointMetadata {
    pub seq: u64,
    pub node: String,
    pub created_at: String,
}

#[async_trait::async_trait]
pub trait HistoryCheckpointer<S: StateSchema>: Send + Sync {
    async fn list_checkpoints(&self, id: &str) -> Result<Vec<CheckpointMetadata>, NovelistError>;
}

#[derive(Clone)]
pub struct InMemoryCheckpointer<S: StateSchema> {
    inner: Arc<RwLock<HashMap<String, Vec<Checkpoint<S>>>>>,
}

impl<S: StateSchema> Default for InMemoryCheckpointer<S> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<S: StateSchema> InMemoryCheckpointer<S> {
    /// Identifiers that have at least one checkpoint, in no particular order.
    pub fn ids(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|guard| guard.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl<S: StateSchema> Checkpointer<S> for InMemoryCheckpointer<S> {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), NovelistError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| NovelistError::CheckpointFailed("lock".into()))?;
        guard
            .entry(checkpoint.id.clone())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Checkpoint<S>>, NovelistError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| NovelistError::CheckpointFailed("lock".into()))?;
        Ok(guard.get(id).and_then(|history| history.last().cloned()))
    }
}

#[async_trait::async_trait]
impl<S: StateSchema> HistoryCheckpointer<S> for InMemoryCheckpointer<S> {
    async fn list_checkpoints(&self, id: &str) -> Result<Vec<CheckpointMetadata>, NovelistError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| NovelistError::CheckpointFailed("lock".into()))?;
        let history = guard.get(id).cloned().unwrap_or_default();
        Ok(history
            .into_iter()
            .enumerate()
            .map(|(idx, cp)| CheckpointMetadata {
                seq: idx as u64 + 1,
                node: cp.node,
                created_at: cp.created_at,
            })
            .collect())
    }
}
