mod error;
mod llm;
mod retriever;
mod retry;
mod validation;
mod value;

pub mod checkpoint;
pub mod file_checkpointer;
pub mod output_parsers;
pub mod state;

pub use checkpoint::{
    Checkpoint, CheckpointMetadata, Checkpointer, HistoryCheckpointer, InMemoryCheckpointer,
};
pub use error::NovelistError;
pub use file_checkpointer::{CheckpointRecord, FileCheckpointer};
pub use llm::{GenerationBackend, GenerationRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
pub use output_parsers::{extract_json, extract_json_as, parse_json_or, strip_code_fence};
pub use retriever::{ContextRetriever, StaticRetriever, StaticSummarizer, Summarizer};
pub use retry::{is_retryable, RetryingBackend};
pub use state::{GraphState, StateSchema, StateUpdate};
pub use validation::{ContentValidator, ValidationResult, EMPTY_CONTENT_ISSUE};
pub use value::{display_value, IntoValue, TryFromValue, Value, ValueMap};
