//! Mock implementations for testing
//!
//! These mocks let the assistant run whole turns without a provider.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, ToolInvocationRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock completion service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    requests: Mutex<Vec<LlmRequest>>,
    delay: Mutex<Option<Duration>>,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            request_started: Arc::new(Notify::new()),
        }
    }

    /// Hold every response for `delay` before returning it
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    /// Delay later responses, leaving earlier turns fast
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Queue a plain text reply
    pub fn queue_reply(&self, text: &str) {
        self.queue_response(LlmResponse::reply(text));
    }

    /// Queue a response carrying tool calls given as `(name, raw arguments)`
    pub fn queue_tool_calls(&self, calls: &[(&str, &str)]) {
        let tool_calls = calls
            .iter()
            .enumerate()
            .map(|(i, (name, args))| {
                ToolInvocationRequest::decode(format!("call_{i}"), *name, *args)
                    .expect("mock tool call arguments must decode")
            })
            .collect();
        self.queue_response(LlmResponse::with_tool_calls(tool_calls));
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().push(request.clone());
        self.request_started.notify_one();

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
