//! Conversation state
//!
//! The message log plus the current batch of pending actions. Every change to
//! the pending set starts a new batch; actions from an older batch refuse to
//! run.

use crate::capabilities::{Arguments, CapabilityRegistry};
use crate::error::ActionError;
use crate::llm::{ConversationMessage, ToolInvocationRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A confirmable capability invocation waiting for the user to trigger it
#[derive(Debug, Clone)]
pub struct PendingAction {
    label: String,
    capability_name: String,
    arguments: Arguments,
    batch: u64,
    registry: Arc<CapabilityRegistry>,
    current_batch: Arc<AtomicU64>,
}

impl PendingAction {
    /// Button text
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn capability_name(&self) -> &str {
        &self.capability_name
    }

    /// Arguments the capability will be called with
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn batch(&self) -> u64 {
        self.batch
    }

    /// A later turn or trigger replaced the batch this action belongs to
    pub fn is_expired(&self) -> bool {
        self.current_batch.load(Ordering::SeqCst) != self.batch
    }

    /// Run the bound capability. Does not clear the pending set; see
    /// `Assistant::trigger_action`.
    pub async fn invoke(&self) -> Result<(), ActionError> {
        if self.is_expired() {
            tracing::info!(label = %self.label, batch = self.batch, "Rejected expired action");
            return Err(ActionError::Expired {
                label: self.label.clone(),
            });
        }

        self.registry
            .invoke(&self.capability_name, self.arguments.clone())
            .await?;
        Ok(())
    }
}

/// Message log and pending actions of one assistant
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    pending: Vec<PendingAction>,
    batch: Arc<AtomicU64>,
}

impl Conversation {
    /// Start a conversation with the assistant's opening message
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ConversationMessage::assistant(greeting)],
            pending: Vec::new(),
            batch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn pending_actions(&self) -> &[PendingAction] {
        &self.pending
    }

    pub fn current_batch(&self) -> u64 {
        self.batch.load(Ordering::SeqCst)
    }

    /// Append the user message and the assistant reply
    pub(crate) fn commit_turn(&mut self, user_text: &str, reply: &str) {
        self.messages.push(ConversationMessage::user(user_text));
        self.messages.push(ConversationMessage::assistant(reply));
    }

    /// Replace the pending set with actions built from `deferred`
    pub(crate) fn install_pending(
        &mut self,
        registry: &Arc<CapabilityRegistry>,
        deferred: Vec<ToolInvocationRequest>,
    ) {
        let batch = self.next_batch();
        self.pending = deferred
            .into_iter()
            .map(|request| {
                let label = request.button_label.unwrap_or_else(|| {
                    tracing::warn!(
                        capability = %request.capability_name,
                        "Action has no button label, using capability name"
                    );
                    request.capability_name.clone()
                });
                PendingAction {
                    label,
                    capability_name: request.capability_name,
                    arguments: request.arguments,
                    batch,
                    registry: Arc::clone(registry),
                    current_batch: Arc::clone(&self.batch),
                }
            })
            .collect();
        tracing::debug!(batch, actions = self.pending.len(), "Pending actions installed");
    }

    pub(crate) fn clear_pending(&mut self) {
        let batch = self.next_batch();
        if !self.pending.is_empty() {
            tracing::debug!(batch, dropped = self.pending.len(), "Pending actions cleared");
        }
        self.pending.clear();
    }

    /// Clear the pending set only if `batch` is still current
    pub(crate) fn clear_pending_batch(&mut self, batch: u64) -> bool {
        if self.current_batch() != batch {
            return false;
        }
        self.clear_pending();
        true
    }

    fn next_batch(&self) -> u64 {
        self.batch.fetch_add(1, Ordering::SeqCst) + 1
    }
}
