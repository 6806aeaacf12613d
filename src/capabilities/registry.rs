//! Registry of capabilities owned by one assistant

use super::navigation::{self, Route, NAVIGATE};
use super::{
    Arguments, ArgumentSpec, CapabilityBinding, CapabilityDescriptor, CapabilityError,
    CapabilityKind, RegistryError, BUTTON_LABEL_ARGUMENT, DATA_PREFIX,
};
use crate::llm::ToolDefinition;
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Capabilities available to one assistant.
///
/// Names are unique across the whole registry, `navigate` included: that name
/// is reserved from construction whether or not navigation is installed.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    navigation: Option<CapabilityBinding>,
    bindings: Vec<CapabilityBinding>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zero-argument data capability, exposed as `_get_<name>`
    pub fn register_data<F, Fut>(
        &mut self,
        name: &str,
        fetch: F,
        description: impl Into<String>,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CapabilityError>> + Send + 'static,
    {
        let full_name = format!("{DATA_PREFIX}{name}");
        self.ensure_unique(&full_name)?;

        let descriptor = CapabilityDescriptor {
            name: full_name,
            kind: CapabilityKind::DataFetch,
            description: description.into(),
            arguments: Vec::new(),
            required: Vec::new(),
        };
        self.push(descriptor, Arc::new(move |_args: Arguments| fetch().boxed()));
        Ok(())
    }

    /// Register a data capability that always yields `value`
    pub fn register_attribute(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        description: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let value = value.into();
        self.register_data(
            name,
            move || {
                let value = value.clone();
                async move { Ok::<_, CapabilityError>(value) }
            },
            description,
        )
    }

    /// Register a confirmable action. `buttonLabel` is appended to the
    /// arguments and to the required list.
    pub fn register_action<F, Fut>(
        &mut self,
        name: &str,
        handler: F,
        description: impl Into<String>,
        mut arguments: Vec<ArgumentSpec>,
        required: &[&str],
    ) -> Result<(), RegistryError>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CapabilityError>> + Send + 'static,
    {
        self.ensure_unique(name)?;

        if let Some(arg) = arguments.iter().find(|a| a.name == BUTTON_LABEL_ARGUMENT) {
            return Err(report(RegistryError::ReservedArgumentName {
                capability: name.to_string(),
                argument: arg.name.clone(),
            }));
        }
        if let Some(missing) = required
            .iter()
            .find(|req| !arguments.iter().any(|a| a.name == **req))
        {
            return Err(report(RegistryError::UnknownRequiredArgument {
                capability: name.to_string(),
                argument: (*missing).to_string(),
            }));
        }

        arguments.push(ArgumentSpec::button_label());
        let mut required: Vec<String> = required.iter().map(|r| (*r).to_string()).collect();
        required.push(BUTTON_LABEL_ARGUMENT.to_string());

        let descriptor = CapabilityDescriptor {
            name: name.to_string(),
            kind: CapabilityKind::ConfirmableAction,
            description: description.into(),
            arguments,
            required,
        };
        self.push(descriptor, Arc::new(move |args: Arguments| handler(args).boxed()));
        Ok(())
    }

    /// Install the built-in `navigate` action over `routes`. Calling again
    /// replaces the route table and navigator.
    pub fn register_navigation<F, Fut>(&mut self, routes: Vec<Route>, navigator: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CapabilityError>> + Send + 'static,
    {
        let replaced = self.navigation.is_some();
        tracing::info!(routes = routes.len(), replaced, "Navigation capability installed");
        self.navigation = Some(navigation::binding(routes, navigator));
    }

    /// Descriptors for every capability, navigation first, then in
    /// registration order
    pub fn describe_all(&self) -> Vec<CapabilityDescriptor> {
        self.iter().map(|b| b.descriptor().clone()).collect()
    }

    /// Tool definitions for the completion client, same order as `describe_all`
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.iter()
            .map(|b| b.descriptor().to_tool_definition())
            .collect()
    }

    /// Kind of the named capability, `None` when unknown
    pub fn classify(&self, name: &str) -> Option<CapabilityKind> {
        self.get(name).map(CapabilityBinding::kind)
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityBinding> {
        self.iter().find(|b| b.name() == name)
    }

    /// Look up and run the named capability
    pub async fn invoke(&self, name: &str, args: Arguments) -> Result<Value, CapabilityError> {
        let binding = self
            .get(name)
            .ok_or_else(|| CapabilityError::not_found(name))?;

        tracing::debug!(capability = %name, "Invoking capability");
        let result = binding.call(args).await;
        if let Err(e) = &result {
            tracing::warn!(capability = %name, error = %e, "Capability invocation failed");
        }
        result
    }

    pub fn len(&self) -> usize {
        self.bindings.len() + usize::from(self.navigation.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_navigation(&self) -> bool {
        self.navigation.is_some()
    }

    fn iter(&self) -> impl Iterator<Item = &CapabilityBinding> {
        self.navigation.iter().chain(self.bindings.iter())
    }

    fn ensure_unique(&self, name: &str) -> Result<(), RegistryError> {
        if name == NAVIGATE || self.bindings.iter().any(|b| b.name() == name) {
            return Err(report(RegistryError::DuplicateCapabilityName {
                name: name.to_string(),
            }));
        }
        Ok(())
    }

    fn push(&mut self, descriptor: CapabilityDescriptor, handler: super::Handler) {
        tracing::debug!(capability = %descriptor.name, kind = ?descriptor.kind, "Capability registered");
        self.bindings.push(CapabilityBinding::new(descriptor, handler));
    }
}

fn report(error: RegistryError) -> RegistryError {
    tracing::error!(error = %error, "Capability registration rejected");
    error
}
