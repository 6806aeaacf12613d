//! Errors surfaced to the host by a turn or an action trigger

use crate::capabilities::CapabilityError;
use crate::dispatcher::TransitionError;
use crate::llm::LlmError;
use thiserror::Error;

/// Why a user turn did not complete
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    #[error("A turn is already in progress")]
    Busy,

    #[error("Model requested unknown capability '{name}'")]
    CapabilityNotFound { name: String },

    #[error("Capability failed during the turn: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("Turn cancelled")]
    Cancelled,

    #[error("Dispatcher rejected event: {0}")]
    Internal(String),
}

impl From<TransitionError> for TurnError {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::Busy => TurnError::Busy,
            TransitionError::InvalidTransition(detail) => TurnError::Internal(detail),
        }
    }
}

impl TurnError {
    /// Stable name for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::Busy => "busy",
            TurnError::CapabilityNotFound { .. } => "capability_not_found",
            TurnError::Capability(_) => "capability",
            TurnError::Completion(_) => "completion",
            TurnError::Cancelled => "cancelled",
            TurnError::Internal(_) => "internal",
        }
    }
}

/// Why a pending action could not run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Action '{label}' belongs to a previous turn")]
    Expired { label: String },

    #[error("No pending action at index {index}")]
    NoSuchAction { index: usize },

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}
