//! App Helper - embeddable in-app conversational assistant
//!
//! Turns a user's message into either a plain reply or a set of
//! user-confirmable actions, by letting a chat-completion model select
//! capabilities the host application registered.

pub mod assistant;
pub mod capabilities;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod llm;
pub mod prompt;

#[cfg(test)]
pub mod testing;

pub use assistant::Assistant;
pub use capabilities::{
    ArgumentSpec, ArgumentType, CapabilityError, CapabilityKind, CapabilityRegistry,
    RegistryError, Route,
};
pub use config::{AssistantConfig, FeedbackModel, ModelSettings, ProviderConfig, Theme};
pub use conversation::PendingAction;
pub use error::{ActionError, TurnError};
pub use llm::{ConversationMessage, LlmError, LlmService, Role};
