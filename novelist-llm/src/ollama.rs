use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use novelist_core::{GenerationBackend, GenerationRequest, NovelistError};

use crate::types::{chat_messages, transport_error, Message};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    timeout: Duration,
    http: Client,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self, NovelistError> {
        Self::with_timeout(base_url, model, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, NovelistError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NovelistError::LlmProvider(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[async_trait::async_trait]
impl GenerationBackend for OllamaClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, NovelistError> {
        let body = OllamaChatRequest {
            model: self.model.clone(),
            messages: chat_messages(&request),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = %self.model, %url, "ollama chat request");
        let response: OllamaChatResponse = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(err, self.timeout))?
            .error_for_status()
            .map_err(|err| NovelistError::LlmProvider(err.to_string()))?
            .json()
            .await
            .map_err(|err| NovelistError::LlmProvider(err.to_string()))?;

        Ok(response.message.content)
    }
}
