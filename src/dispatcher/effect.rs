//! Effects produced by state transitions

use crate::error::TurnError;
use crate::llm::ToolInvocationRequest;

/// Effects to be executed by the runtime after a transition, in order
#[derive(Debug, Clone)]
pub enum Effect {
    /// Ask for the completion that may select capabilities
    RequestPrimaryCompletion { user_text: String },

    /// Run the data fetches in order, then ask for the feedback completion
    RequestFeedback {
        user_text: String,
        data_fetches: Vec<ToolInvocationRequest>,
        deferred: Vec<ToolInvocationRequest>,
    },

    /// Append the user message and the assistant reply to the log
    CommitTurn { user_text: String, reply: String },

    /// Replace the pending set with actions built from `deferred`
    InstallPendingActions { deferred: Vec<ToolInvocationRequest> },

    ClearPendingActions,

    /// Record the user message with a visible failure notice and report `error`
    FailTurn { user_text: String, error: TurnError },
}

impl Effect {
    pub fn commit(user_text: impl Into<String>, reply: impl Into<String>) -> Self {
        Effect::CommitTurn {
            user_text: user_text.into(),
            reply: reply.into(),
        }
    }

    pub fn fail(user_text: impl Into<String>, error: impl Into<TurnError>) -> Self {
        Effect::FailTurn {
            user_text: user_text.into(),
            error: error.into(),
        }
    }

    /// The effect ends the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, Effect::CommitTurn { .. } | Effect::FailTurn { .. })
    }
}
