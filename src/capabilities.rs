//! Capabilities the assistant may ask the model to invoke
//!
//! A capability is either a silent data fetch, executed as soon as the model
//! asks for it, or a confirmable action that is only executed once the user
//! presses the button generated for it.

mod navigation;
mod registry;

pub use navigation::{Route, DESTINATION_ARGUMENT, NAVIGATE};
pub use registry::CapabilityRegistry;

use crate::llm::ToolDefinition;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Decoded arguments passed to a bound capability
pub type Arguments = Map<String, Value>;

/// Synthetic argument every confirmable action carries, used only as the
/// button text
pub const BUTTON_LABEL_ARGUMENT: &str = "buttonLabel";

const BUTTON_LABEL_DESCRIPTION: &str =
    "Text of the button shown in the chat that lets the user run this action";

/// Prefix given to data capabilities
pub const DATA_PREFIX: &str = "_get_";

/// How the dispatcher treats a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Executed immediately; its value feeds the feedback completion
    DataFetch,
    /// Deferred until the user confirms it
    ConfirmableAction,
}

/// JSON-schema type of a capability argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ArgumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArgumentType::String => "string",
            ArgumentType::Number => "number",
            ArgumentType::Integer => "integer",
            ArgumentType::Boolean => "boolean",
        }
    }
}

/// One argument of a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: ArgumentType,
    pub description: String,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, arg_type: ArgumentType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arg_type,
            description: description.into(),
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ArgumentType::String, description)
    }

    fn button_label() -> Self {
        Self::string(BUTTON_LABEL_ARGUMENT, BUTTON_LABEL_DESCRIPTION)
    }
}

/// Everything the model is told about a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub kind: CapabilityKind,
    pub description: String,
    pub arguments: Vec<ArgumentSpec>,
    pub required: Vec<String>,
}

impl CapabilityDescriptor {
    /// JSON schema of the arguments object
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .arguments
            .iter()
            .map(|arg| {
                (
                    arg.name.clone(),
                    json!({
                        "type": arg.arg_type.as_str(),
                        "description": arg.description,
                    }),
                )
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    pub fn to_tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
        }
    }
}

/// Failure of a bound capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("Capability not found: {name}")]
    NotFound { name: String },

    #[error("Invalid arguments: {reason}")]
    InvalidArguments { reason: String },

    #[error("Capability failed: {message}")]
    Failed { message: String },
}

impl CapabilityError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Rejected registration; the registry is left untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Capability name already exists ({name})")]
    DuplicateCapabilityName { name: String },

    #[error("Capability '{capability}' requires undeclared argument '{argument}'")]
    UnknownRequiredArgument { capability: String, argument: String },

    #[error("Capability '{capability}' declares reserved argument '{argument}'")]
    ReservedArgumentName { capability: String, argument: String },
}

/// Future returned by a bound capability
pub type CapabilityFuture = BoxFuture<'static, Result<Value, CapabilityError>>;

type Handler = Arc<dyn Fn(Arguments) -> CapabilityFuture + Send + Sync>;

/// A descriptor paired with the host function that implements it
#[derive(Clone)]
pub struct CapabilityBinding {
    descriptor: CapabilityDescriptor,
    handler: Handler,
}

impl CapabilityBinding {
    fn new(descriptor: CapabilityDescriptor, handler: Handler) -> Self {
        Self {
            descriptor,
            handler,
        }
    }

    pub fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn kind(&self) -> CapabilityKind {
        self.descriptor.kind
    }

    /// Run the bound function
    pub fn call(&self, args: Arguments) -> CapabilityFuture {
        (self.handler)(args)
    }
}

impl std::fmt::Debug for CapabilityBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityBinding")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
