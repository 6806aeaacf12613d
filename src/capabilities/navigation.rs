//! Built-in navigation capability

use super::{
    Arguments, ArgumentSpec, CapabilityBinding, CapabilityDescriptor, CapabilityError,
    CapabilityKind, BUTTON_LABEL_ARGUMENT,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Write;
use std::future::Future;
use std::sync::Arc;

/// Name of the navigation capability
pub const NAVIGATE: &str = "navigate";

/// Argument carrying the route identifier
pub const DESTINATION_ARGUMENT: &str = "destination";

const NAVIGATE_DESCRIPTION: &str =
    "Creates buttons that take the user to a screen of the app, using the available destinations.";

/// A screen the assistant can send the user to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Identifier handed to the navigator, e.g. a deep link
    pub id: String,
    pub description: String,
}

impl Route {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

fn destination_description(routes: &[Route]) -> String {
    let mut text = String::from("Destination to navigate to. Available destinations are:");
    for route in routes {
        let _ = write!(text, "\n{}: {}", route.id, route.description);
    }
    text
}

fn descriptor(routes: &[Route]) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: NAVIGATE.to_string(),
        kind: CapabilityKind::ConfirmableAction,
        description: NAVIGATE_DESCRIPTION.to_string(),
        arguments: vec![
            ArgumentSpec::string(DESTINATION_ARGUMENT, destination_description(routes)),
            ArgumentSpec::button_label(),
        ],
        required: vec![
            DESTINATION_ARGUMENT.to_string(),
            BUTTON_LABEL_ARGUMENT.to_string(),
        ],
    }
}

/// Build the `navigate` binding. The destination is only constrained by the
/// description; unknown destinations are logged and still forwarded.
pub(super) fn binding<F, Fut>(routes: Vec<Route>, navigator: F) -> CapabilityBinding
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CapabilityError>> + Send + 'static,
{
    let descriptor = descriptor(&routes);
    let known: HashSet<String> = routes.into_iter().map(|r| r.id).collect();
    let navigator = Arc::new(navigator);

    let handler = move |args: Arguments| {
        let navigator = Arc::clone(&navigator);
        let destination = args
            .get(DESTINATION_ARGUMENT)
            .and_then(Value::as_str)
            .map(str::to_string);
        let known_route = destination.as_ref().is_some_and(|d| known.contains(d));

        async move {
            let destination = destination.ok_or_else(|| {
                CapabilityError::invalid_arguments(format!(
                    "'{DESTINATION_ARGUMENT}' must be a string"
                ))
            })?;
            if !known_route {
                tracing::warn!(destination = %destination, "Navigating to a destination outside the route table");
            }
            tracing::info!(destination = %destination, "Navigating");
            (*navigator)(destination).await?;
            Ok::<_, CapabilityError>(Value::Null)
        }
        .boxed()
    };

    CapabilityBinding::new(descriptor, Arc::new(handler))
}
