use std::time::Duration;

use serde::{Deserialize, Serialize};

use novelist_core::{GenerationRequest, NovelistError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Optional system message first, then the prompt as the user turn.
pub(crate) fn chat_messages(request: &GenerationRequest) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request
        .system_message
        .as_deref()
        .filter(|system| !system.trim().is_empty())
    {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(request.prompt.clone()));
    messages
}

pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> NovelistError {
    if err.is_timeout() {
        NovelistError::Timeout(timeout)
    } else {
        NovelistError::LlmProvider(err.to_string())
    }
}
