//! Completion client abstraction
//!
//! One trait in front of the chat-completion provider, plus a logging
//! decorator and an `OpenAI`-compatible implementation.

mod error;
mod openai;
mod types;

#[cfg(test)]
mod proptests;

pub use error::{LlmError, LlmErrorKind};
pub use openai::OpenAIService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Identifier used in logs
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: LlmService + ?Sized> LlmService for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let elapsed_ms = start.elapsed().as_millis();
        let model = request.settings.model.as_str();
        let offered = request.tools.len();

        match &result {
            Ok(response) if response.has_tool_calls() => {
                let requested: Vec<&str> = response
                    .tool_calls
                    .iter()
                    .map(|call| call.capability_name.as_str())
                    .collect();
                tracing::info!(
                    service = %self.model_id,
                    model,
                    elapsed_ms = %elapsed_ms,
                    offered,
                    requested = ?requested,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Model requested capabilities"
                );
            }
            Ok(response) => tracing::info!(
                service = %self.model_id,
                model,
                elapsed_ms = %elapsed_ms,
                offered,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Model replied"
            ),
            Err(e) => tracing::error!(
                service = %self.model_id,
                model,
                elapsed_ms = %elapsed_ms,
                kind = ?e.kind,
                retryable = e.kind.is_retryable(),
                error = %e.message,
                "Completion failed"
            ),
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
