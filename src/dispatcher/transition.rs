//! Pure state transition function

use super::{Effect, Event, TurnState};
use crate::capabilities::{CapabilityKind, CapabilityRegistry};
use crate::error::TurnError;
use crate::llm::{CompletionResult, ToolInvocationRequest};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A turn is already in progress")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// The registry is only read, to classify requested capabilities. Given the
/// same inputs it always produces the same outputs.
pub fn transition(
    state: &TurnState,
    registry: &CapabilityRegistry,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Blank input never starts a turn
        (TurnState::Idle, Event::UserMessage { text }) if text.trim().is_empty() => {
            Ok(TransitionResult::new(TurnState::Idle))
        }

        // A new turn is a boundary: earlier actions expire before the request
        (TurnState::Idle, Event::UserMessage { text }) => Ok(TransitionResult::new(
            TurnState::AwaitingPrimaryCompletion {
                user_text: text.clone(),
            },
        )
        .with_effect(Effect::ClearPendingActions)
        .with_effect(Effect::RequestPrimaryCompletion { user_text: text })),

        (_, Event::UserMessage { .. }) => Err(TransitionError::Busy),

        (
            TurnState::AwaitingPrimaryCompletion { user_text },
            Event::PrimaryCompleted(CompletionResult::PlainReply { text }),
        ) => Ok(TransitionResult::new(TurnState::Idle)
            .with_effect(Effect::commit(user_text.as_str(), text))
            .with_effect(Effect::ClearPendingActions)),

        (
            TurnState::AwaitingPrimaryCompletion { user_text },
            Event::PrimaryCompleted(CompletionResult::ToolCalls { requests }),
        ) => match partition(registry, requests) {
            Ok((data_fetches, deferred)) => Ok(TransitionResult::new(
                TurnState::AwaitingFeedbackCompletion {
                    user_text: user_text.clone(),
                    deferred: deferred.clone(),
                },
            )
            .with_effect(Effect::RequestFeedback {
                user_text: user_text.clone(),
                data_fetches,
                deferred,
            })),
            Err(error) => Ok(TransitionResult::new(TurnState::Idle)
                .with_effect(Effect::fail(user_text.as_str(), error))),
        },

        (
            TurnState::AwaitingFeedbackCompletion {
                user_text,
                deferred,
            },
            Event::FeedbackCompleted { text },
        ) => Ok(TransitionResult::new(TurnState::Idle)
            .with_effect(Effect::commit(user_text.as_str(), text))
            .with_effect(Effect::InstallPendingActions {
                deferred: deferred.clone(),
            })),

        (
            TurnState::AwaitingPrimaryCompletion { user_text }
            | TurnState::AwaitingFeedbackCompletion { user_text, .. },
            Event::CompletionFailed { error },
        ) => Ok(TransitionResult::new(TurnState::Idle)
            .with_effect(Effect::fail(user_text.as_str(), error))),

        (TurnState::AwaitingFeedbackCompletion { user_text, .. }, Event::DataFetchFailed { error }) => {
            Ok(TransitionResult::new(TurnState::Idle)
                .with_effect(Effect::fail(user_text.as_str(), error)))
        }

        // Cancellation abandons the turn without touching the log
        (
            TurnState::AwaitingPrimaryCompletion { .. } | TurnState::AwaitingFeedbackCompletion { .. },
            Event::Cancelled,
        ) => Ok(TransitionResult::new(TurnState::Idle)),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {}",
            state.name()
        ))),
    }
}

/// Split requests into data fetches and deferred actions, preserving request
/// order within each. Any unknown name fails the whole batch.
fn partition(
    registry: &CapabilityRegistry,
    requests: Vec<ToolInvocationRequest>,
) -> Result<(Vec<ToolInvocationRequest>, Vec<ToolInvocationRequest>), TurnError> {
    let mut data_fetches = Vec::new();
    let mut deferred = Vec::new();

    for request in requests {
        match registry.classify(&request.capability_name) {
            Some(CapabilityKind::DataFetch) => data_fetches.push(request),
            Some(CapabilityKind::ConfirmableAction) => deferred.push(request),
            None => {
                return Err(TurnError::CapabilityNotFound {
                    name: request.capability_name,
                })
            }
        }
    }

    Ok((data_fetches, deferred))
}
