use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::{
    Checkpoint, CheckpointMetadata, Checkpointer, HistoryCheckpointer, NovelistError, StateSchema,
};

/// One line of a checkpoint file. The state stays untyped until the schema
/// version has been checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub seq: u64,
    pub id: String,
    pub schema_version: u32,
    pub step: u64,
    pub node: String,
    pub created_at: String,
    pub state: Value,
}

/// Append-only JSONL store: one file per checkpoint identifier, the last line
/// is the current checkpoint.
#[derive(Clone, Debug)]
pub struct FileCheckpointer {
    base_dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn sanitize_id(id: &str) -> String {
        let mut out = String::with_capacity(id.len());
        for ch in id.chars() {
            match ch {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
                c if c.is_control() => {}
                c => out.push(c),
            }
        }
        let trimmed = out.trim_matches(|c: char| c == '.' || c.is_whitespace() || c == '_');
        if trimmed.is_empty() {
            let mut hasher = DefaultHasher::new();
            id.hash(&mut hasher);
            return format!("checkpoint-{:08x}", hasher.finish());
        }
        trimmed.to_string()
    }

    fn checkpoint_path(&self, id: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.jsonl", Self::sanitize_id(id)))
    }

    async fn read_contents(&self, id: &str) -> Result<String, NovelistError> {
        match fs::read_to_string(self.checkpoint_path(id)).await {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(NovelistError::CheckpointFailed(err.to_string())),
        }
    }

    async fn read_records(&self, id: &str) -> Result<Vec<CheckpointRecord>, NovelistError> {
        let contents = self.read_contents(id).await?;
        Ok(Self::parse_records(id, &contents))
    }

    // A crash mid-append leaves a torn line; the last intact record stays current.
    fn parse_records(id: &str, contents: &str) -> Vec<CheckpointRecord> {
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(idx, line)| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(
                        checkpoint_id = id,
                        line = idx + 1,
                        error = %err,
                        "skipping undecodable checkpoint record"
                    );
                    None
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl<S: StateSchema> Checkpointer<S> for FileCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), NovelistError> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|err| NovelistError::CheckpointFailed(err.to_string()))?;

        let existing = self.read_contents(&checkpoint.id).await?;
        let seq = Self::parse_records(&checkpoint.id, &existing)
            .last()
            .map(|record| record.seq + 1)
            .unwrap_or(1);
        let record = CheckpointRecord {
            seq,
            id: checkpoint.id.clone(),
            schema_version: checkpoint.schema_version,
            step: checkpoint.step,
            node: checkpoint.node.clone(),
            created_at: checkpoint.created_at.clone(),
            state: serde_json::to_value(&checkpoint.state)?,
        };
        let mut line = serde_json::to_string(&record)
            .map_err(|err| NovelistError::CheckpointFailed(err.to_string()))?;
        line.push('\n');
        if !existing.is_empty() && !existing.ends_with('\n') {
            line.insert(0, '\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.checkpoint_path(&checkpoint.id))
            .await
            .map_err(|err| NovelistError::CheckpointFailed(err.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|err| NovelistError::CheckpointFailed(err.to_string()))?;
        file.flush()
            .await
            .map_err(|err| NovelistError::CheckpointFailed(err.to_string()))?;
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Checkpoint<S>>, NovelistError> {
        let Some(record) = self.read_records(id).await?.pop() else {
            return Ok(None);
        };
        if record.schema_version != S::SCHEMA_VERSION {
            return Err(NovelistError::IncompatibleCheckpoint {
                found: record.schema_version,
                expected: S::SCHEMA_VERSION,
            });
        }
        let state: S = serde_json::from_value(record.state).map_err(|err| {
            NovelistError::CheckpointFailed(format!("failed to deserialize checkpoint state: {err}"))
        })?;
        Ok(Some(Checkpoint {
            id: record.id,
            schema_version: record.schema_version,
            step: record.step,
            node: record.node,
            created_at: record.created_at,
            state,
        }))
    }
}

#[async_trait::async_trait]
impl<S: StateSchema> HistoryCheckpointer<S> for FileCheckpointer {
    async fn list_checkpoints(&self, id: &str) -> Result<Vec<CheckpointMetadata>, NovelistError> {
        Ok(self
            .read_records(id)
            .await?
            .into_iter()
            .map(|record| CheckpointMetadata {
                seq: record.seq,
                node: record.node,
                created_at: record.created_at,
            })
            .collect())
    }
}
