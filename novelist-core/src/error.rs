use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NovelistError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    #[error("Context retrieval failed: {0}")]
    Retrieval(String),
    #[error("Content validation failed: {0}")]
    Validation(String),
    #[error("Parsing failed on output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Max retries ({max}) exceeded")]
    MaxRetriesExceeded { max: usize },
    #[error("Checkpoint failed: {0}")]
    CheckpointFailed(String),
    #[error("Incompatible checkpoint: schema version {found}, expected {expected}")]
    IncompatibleCheckpoint { found: u32, expected: u32 },
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl NovelistError {
    /// Errors a caller may reasonably retry: transport failures and timeouts.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NovelistError::LlmProvider(_)
                | NovelistError::Retrieval(_)
                | NovelistError::Timeout(_)
        )
    }
}
