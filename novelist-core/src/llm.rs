use serde::{Deserialize, Serialize};

use crate::NovelistError;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// One text-completion call: a prompt plus sampling options.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_message: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = Some(system_message.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text-completion capability. Implementations do not retry on their own;
/// wrap them in [`crate::RetryingBackend`] when retries are wanted.
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync + 'static {
    async fn generate(&self, request: GenerationRequest) -> Result<String, NovelistError>;
}

#[async_trait::async_trait]
impl<B> GenerationBackend for std::sync::Arc<B>
where
    B: GenerationBackend + ?Sized,
{
    async fn generate(&self, request: GenerationRequest) -> Result<String, NovelistError> {
        (**self).generate(request).await
    }
}
