//! Generation backend adapters for chat-style HTTP endpoints.

mod types;

#[cfg(feature = "ollama")]
mod ollama;

// OpenAI-compatible client (always available)
pub mod openai_compatible;

#[cfg(feature = "ollama")]
pub use ollama::OllamaClient;
pub use openai_compatible::{
    ChatCompletionRequest, ChatCompletionResponse, OpenAiCompatibleBuilder, OpenAiCompatibleClient,
};
pub use types::{Message, Role};

pub use novelist_core::{GenerationBackend, GenerationRequest, NovelistError};
