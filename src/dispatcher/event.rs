//! Events that drive a turn

use crate::capabilities::CapabilityError;
use crate::llm::{CompletionResult, LlmError};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage { text: String },

    // Completion events
    PrimaryCompleted(CompletionResult),
    FeedbackCompleted { text: String },
    CompletionFailed { error: LlmError },

    // Capability events
    DataFetchFailed { error: CapabilityError },

    /// The turn's cancellation token fired
    Cancelled,
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Event::UserMessage { text: text.into() }
    }
}
