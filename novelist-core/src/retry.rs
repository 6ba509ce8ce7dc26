use std::time::Duration;

use crate::{GenerationBackend, GenerationRequest, NovelistError};

/// Retries transient backend failures. Opt-in: nothing in the pipeline
/// wraps a backend implicitly.
pub struct RetryingBackend<B> {
    backend: B,
    max_attempts: usize,
    backoff: Duration,
}

impl<B> RetryingBackend<B> {
    pub fn new(backend: B, max_attempts: usize) -> Self {
        Self {
            backend,
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    /// `retries` extra attempts after the first one, so zero still calls the
    /// backend once.
    pub fn with_retries(backend: B, retries: usize) -> Self {
        Self::new(backend, retries.saturating_add(1))
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

pub fn is_retryable(error: &NovelistError) -> bool {
    matches!(
        error,
        NovelistError::LlmProvider(_) | NovelistError::Timeout(_)
    )
}

#[async_trait::async_trait]
impl<B> GenerationBackend for RetryingBackend<B>
where
    B: GenerationBackend,
{
    async fn generate(&self, request: GenerationRequest) -> Result<String, NovelistError> {
        if self.max_attempts == 0 {
            return Err(NovelistError::MaxRetriesExceeded { max: 0 });
        }

        for attempt in 1..=self.max_attempts {
            match self.backend.generate(request.clone()).await {
                Ok(output) => return Ok(output),
                Err(error) => {
                    if !is_retryable(&error) {
                        return Err(error);
                    }
                    tracing::warn!(attempt, max = self.max_attempts, error = %error, "generation attempt failed");
                    if attempt < self.max_attempts && !self.backoff.is_zero() {
                        let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
                        tokio::time::sleep(self.backoff.saturating_mul(factor)).await;
                    }
                }
            }
        }

        Err(NovelistError::MaxRetriesExceeded {
            max: self.max_attempts,
        })
    }
}
