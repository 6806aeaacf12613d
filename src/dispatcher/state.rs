//! Turn states

use crate::llm::ToolInvocationRequest;

/// Where the current turn is.
///
/// `Idle` is both the initial state and the state every turn ends in.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TurnState {
    #[default]
    Idle,

    /// Waiting for the completion that may select capabilities
    AwaitingPrimaryCompletion { user_text: String },

    /// Data fetched, waiting for the summary of the turn's results
    AwaitingFeedbackCompletion {
        user_text: String,
        /// Confirmable actions that become pending once the turn commits
        deferred: Vec<ToolInvocationRequest>,
    },
}

impl TurnState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TurnState::Idle)
    }

    /// A turn is in flight
    pub fn is_busy(&self) -> bool {
        !self.is_idle()
    }

    /// Name for logs
    pub fn name(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingPrimaryCompletion { .. } => "awaiting_primary_completion",
            TurnState::AwaitingFeedbackCompletion { .. } => "awaiting_feedback_completion",
        }
    }
}
