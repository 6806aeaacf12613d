//! Prompt construction
//!
//! Builds the persona/scope system prompt, the per-turn message list, and the
//! system prompt of the feedback completion that summarises tool results.

use crate::config::AssistantConfig;
use crate::llm::{ConversationMessage, ToolInvocationRequest};
use serde::Serialize;
use serde_json::Value;

/// Base system prompt establishing scope. `{name}` and `{language}` are
/// substituted from the assistant configuration.
const BASE_PROMPT: &str = r"You are {name}, an assistant built into a mobile application to make it more accessible. Your purpose is to help users move between the sections of the app or reach the data the app provides directly. Only answer questions about the app's functionality, navigation, or the data available inside it.

Do not try to answer questions unrelated to the app. If the user asks for something outside your scope, kindly tell them you can only help with topics related to the app.

Never embed links in your replies; the chat cannot open them.

Always reply in {language}.

Your goal is a smooth, fast and efficient experience for the user inside the app.";

const FEEDBACK_PROMPT: &str = r"You are an assistant that gives clear, friendly feedback based on results. The following user data was retrieved: {user_data}. The following actions were prepared: {actions}. A button is already shown below your message for each of these actions, so do not ask the user to confirm them or tell them how to run them. Keep the reply short and always reply in {language}.";

/// System prompt for the primary completion
pub fn build_system_prompt(config: &AssistantConfig) -> String {
    BASE_PROMPT
        .replace("{name}", &config.name)
        .replace("{language}", &config.language)
}

/// Opening assistant message shown before the first turn
pub fn greeting(config: &AssistantConfig) -> String {
    config.first_message.clone().unwrap_or_else(|| {
        format!(
            "Hi! I'm {}, your personal assistant. I'm here to answer your questions and help you \
             find your way around the app, taking you to the right screen or giving you the \
             information you need. How can I help you today?",
            config.name
        )
    })
}

/// `[system] + history + [user]`. History is passed through untouched.
pub fn compose_messages(
    system_prompt: &str,
    history: &[ConversationMessage],
    user_text: &str,
) -> Vec<ConversationMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ConversationMessage::system(system_prompt));
    messages.extend_from_slice(history);
    messages.push(ConversationMessage::user(user_text));
    messages
}

/// What the feedback prompt says about a deferred action
#[derive(Debug, Serialize)]
struct DeferredSummary<'a> {
    name: &'a str,
    arguments: &'a crate::capabilities::Arguments,
    #[serde(rename = "buttonLabel", skip_serializing_if = "Option::is_none")]
    button_label: Option<&'a str>,
}

/// System prompt for the feedback completion
pub fn build_feedback_prompt(
    user_data: &[Value],
    deferred: &[ToolInvocationRequest],
    language: &str,
) -> String {
    let summaries: Vec<DeferredSummary<'_>> = deferred
        .iter()
        .map(|req| DeferredSummary {
            name: &req.capability_name,
            arguments: &req.arguments,
            button_label: req.button_label.as_deref(),
        })
        .collect();

    let user_data = serde_json::to_string(user_data).unwrap_or_else(|_| "[]".to_string());
    let actions = serde_json::to_string(&summaries).unwrap_or_else(|_| "[]".to_string());

    FEEDBACK_PROMPT
        .replace("{user_data}", &user_data)
        .replace("{actions}", &actions)
        .replace("{language}", language)
}

/// Message list for the feedback completion: no history, just the feedback
/// instructions and the user's message
pub fn compose_feedback_messages(feedback_prompt: &str, user_text: &str) -> Vec<ConversationMessage> {
    vec![
        ConversationMessage::system(feedback_prompt),
        ConversationMessage::user(user_text),
    ]
}
