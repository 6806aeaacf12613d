//! Common types for completion requests

use super::LlmError;
use crate::capabilities::{Arguments, BUTTON_LABEL_ARGUMENT};
use crate::config::ModelSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the conversation log, resent in full on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: Option<String>,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
        }
    }

    /// Text content, empty when the provider sent none
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Tool definition handed to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Completion request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<ToolDefinition>,
    pub settings: ModelSettings,
}

/// A tool call requested by the model, with its arguments decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Provider-assigned call id
    pub id: String,
    pub capability_name: String,
    pub raw_arguments: String,
    /// Decoded arguments, without the button label
    pub arguments: Arguments,
    pub button_label: Option<String>,
}

impl ToolInvocationRequest {
    /// Decode a raw provider tool call.
    ///
    /// An empty or `null` argument string decodes to an empty map. The
    /// `buttonLabel` entry is lifted out of the map so it never reaches the
    /// bound capability.
    pub fn decode(
        id: impl Into<String>,
        capability_name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let capability_name = capability_name.into();
        let raw_arguments = raw_arguments.into();

        let mut arguments = if raw_arguments.trim().is_empty() {
            Arguments::new()
        } else {
            match serde_json::from_str::<Value>(&raw_arguments) {
                Ok(Value::Object(map)) => map,
                Ok(Value::Null) => Arguments::new(),
                Ok(other) => {
                    return Err(LlmError::invalid_response(format!(
                        "Arguments for '{capability_name}' are not a JSON object: {other}"
                    )))
                }
                Err(e) => {
                    return Err(LlmError::invalid_response(format!(
                        "Malformed arguments for '{capability_name}': {e}"
                    )))
                }
            }
        };

        let button_label = arguments
            .remove(BUTTON_LABEL_ARGUMENT)
            .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
            .filter(|label| !label.is_empty());

        Ok(Self {
            id: id.into(),
            capability_name,
            raw_arguments,
            arguments,
            button_label,
        })
    }
}

/// Completion response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocationRequest>,
    pub usage: Usage,
}

impl LlmResponse {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolInvocationRequest>) -> Self {
        Self {
            tool_calls,
            ..Self::default()
        }
    }

    /// Check if response contains any tool use requests
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Collapse into the two outcomes the dispatcher understands
    pub fn into_completion(self) -> CompletionResult {
        if self.tool_calls.is_empty() {
            CompletionResult::PlainReply {
                text: self.text.unwrap_or_default(),
            }
        } else {
            CompletionResult::ToolCalls {
                requests: self.tool_calls,
            }
        }
    }
}

/// What a completion turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResult {
    PlainReply { text: String },
    ToolCalls { requests: Vec<ToolInvocationRequest> },
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
