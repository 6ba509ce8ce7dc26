//! Generic OpenAI-compatible chat client
//!
//! Works with any provider that speaks OpenAI's `/v1/chat/completions` format
//! (OpenAI, DeepSeek, vLLM, llama.cpp server and similar).

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use novelist_core::{GenerationBackend, GenerationRequest, NovelistError};

use crate::types::{chat_messages, transport_error, Message};

/// Request body for the chat completions endpoint
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

/// Non-streaming response from chat completions
#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

/// OpenAI-style error response
#[derive(Deserialize, Debug, Clone)]
struct OpenAiError {
    error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: Client,
    base_url: Url,
    api_key: Option<Arc<SecretString>>,
    default_model: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("base_url", &self.base_url.as_str())
            .field("default_model", &self.default_model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::default()
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn endpoint(&self) -> Result<Url, NovelistError> {
        // A base URL with a path prefix must keep it, so join on a trailing slash.
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("v1/chat/completions")
            .map_err(|err| NovelistError::InvalidConfig(err.to_string()))
    }
}

#[async_trait::async_trait]
impl GenerationBackend for OpenAiCompatibleClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, NovelistError> {
        let body = ChatCompletionRequest {
            model: self.default_model.clone(),
            messages: chat_messages(&request),
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            stream: false,
        };

        let mut call = self.http.post(self.endpoint()?).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key.expose_secret());
        }
        tracing::debug!(model = %self.default_model, "chat completion request");

        let response = call
            .send()
            .await
            .map_err(|err| transport_error(err, self.timeout))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OpenAiError>(&text)
                .map(|err| err.error.message)
                .unwrap_or(text);
            return Err(NovelistError::LlmProvider(format!("{status}: {detail}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| NovelistError::LlmProvider(err.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| NovelistError::LlmProvider("response contained no choices".to_string()))
    }
}

pub struct OpenAiCompatibleBuilder {
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    default_model: Option<String>,
    timeout: Duration,
}

impl Default for OpenAiCompatibleBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            default_model: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl OpenAiCompatibleBuilder {
    pub fn base_url(mut self, url: &str) -> Result<Self, NovelistError> {
        let parsed = Url::parse(url).map_err(|err| NovelistError::InvalidConfig(err.to_string()))?;
        self.base_url = Some(parsed);
        Ok(self)
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(key.into()));
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, NovelistError> {
        let base_url = self
            .base_url
            .ok_or_else(|| NovelistError::InvalidConfig("base_url is required".to_string()))?;
        let default_model = self
            .default_model
            .ok_or_else(|| NovelistError::InvalidConfig("default_model is required".to_string()))?;
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| NovelistError::LlmProvider(err.to_string()))?;
        Ok(OpenAiCompatibleClient {
            http,
            base_url,
            api_key: self.api_key.map(Arc::new),
            default_model,
            timeout: self.timeout,
        })
    }
}
