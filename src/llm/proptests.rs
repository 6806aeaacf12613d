//! Property-based tests for the provider translation layer
//!
//! These tests verify that the translation between our internal types
//! and the chat-completions wire format preserves key invariants:
//! - Empty responses are rejected
//! - Tool calls with empty names are rejected
//! - Non-object arguments are rejected
//! - Message order and content survive translation
//! - The button label never reaches decoded arguments

#![allow(clippy::redundant_closure_for_method_calls)]

use super::openai::{
    OpenAIChoice, OpenAIFunctionCall, OpenAIMessage, OpenAIResponse, OpenAIService,
    OpenAIToolCall, OpenAIUsage,
};
use super::types::{ConversationMessage, LlmRequest, Role, ToolDefinition, ToolInvocationRequest};
use crate::capabilities::BUTTON_LABEL_ARGUMENT;
use crate::config::ModelSettings;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::System), Just(Role::User), Just(Role::Assistant)]
}

fn arb_message() -> impl Strategy<Value = ConversationMessage> {
    (arb_role(), proptest::option::of("[a-zA-Z0-9 _.!?,]{0,80}"))
        .prop_map(|(role, content)| ConversationMessage { role, content })
}

fn arb_tool() -> impl Strategy<Value = ToolDefinition> {
    ("[a-z_]{3,20}", "[a-zA-Z ]{0,40}").prop_map(|(name, description)| ToolDefinition {
        name,
        description,
        input_schema: json!({ "type": "object", "properties": {} }),
    })
}

fn arb_model() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("gpt-4o-mini".to_string()),
        Just("gpt-4o".to_string()),
        Just("o3-mini".to_string()),
        Just("gpt-5".to_string()),
        "[a-z]{3,8}-[0-9]{1,2}b",
    ]
}

/// Scalar JSON values for argument maps
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ]
}

fn arb_arguments() -> impl Strategy<Value = Map<String, Value>> {
    proptest::collection::btree_map("[a-z]{1,10}", arb_scalar(), 0..5)
        .prop_map(|entries| entries.into_iter().collect())
}

fn arb_tool_call() -> impl Strategy<Value = OpenAIToolCall> {
    ("call_[a-z0-9]{6}", "[a-z_]{3,20}", arb_arguments()).prop_map(|(id, name, args)| {
        OpenAIToolCall {
            id,
            r#type: "function".to_string(),
            function: OpenAIFunctionCall {
                name,
                arguments: Value::Object(args).to_string(),
            },
        }
    })
}

fn response_with(content: Option<String>, tool_calls: Option<Vec<OpenAIToolCall>>) -> OpenAIResponse {
    OpenAIResponse {
        choices: vec![OpenAIChoice {
            message: OpenAIMessage {
                role: "assistant".to_string(),
                content,
                tool_calls,
            },
        }],
        usage: Some(OpenAIUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
        }),
    }
}

proptest! {
    // Messages keep their order, role and content
    #[test]
    fn prop_translate_preserves_messages(
        messages in proptest::collection::vec(arb_message(), 1..10),
        tools in proptest::collection::vec(arb_tool(), 0..5),
        model in arb_model(),
    ) {
        let request = LlmRequest {
            messages: messages.clone(),
            tools: tools.clone(),
            settings: ModelSettings::with_model(model),
        };
        let wire = OpenAIService::translate_request(&request);

        prop_assert_eq!(wire.messages.len(), messages.len());
        for (out, msg) in wire.messages.iter().zip(&messages) {
            prop_assert_eq!(out.role.as_str(), msg.role.as_str());
            prop_assert_eq!(&out.content, &msg.content);
            prop_assert!(out.tool_calls.is_none());
        }

        let names: Vec<String> = wire
            .tools
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        let expected: Vec<String> = tools.into_iter().map(|t| t.name).collect();
        prop_assert_eq!(names, expected);
    }

    // Exactly one of max_tokens / max_completion_tokens is sent
    #[test]
    fn prop_exactly_one_token_limit(model in arb_model(), max_tokens in 1u32..100_000) {
        let mut settings = ModelSettings::with_model(model);
        settings.max_tokens = max_tokens;
        let request = LlmRequest {
            messages: vec![ConversationMessage::user("hi")],
            tools: vec![],
            settings,
        };
        let wire = OpenAIService::translate_request(&request);

        prop_assert!(wire.max_tokens.is_some() != wire.max_completion_tokens.is_some());
        prop_assert_eq!(wire.max_tokens.or(wire.max_completion_tokens), Some(max_tokens));
        prop_assert_eq!(wire.temperature.is_some(), wire.max_tokens.is_some());
    }

    // Tool calls decode in order, with the button label lifted out
    #[test]
    fn prop_tool_calls_decode_in_order(
        calls in proptest::collection::vec(arb_tool_call(), 1..6),
        label in "[A-Za-z ]{1,20}",
    ) {
        let mut calls = calls;
        let first = &mut calls[0].function;
        let mut args: Map<String, Value> = serde_json::from_str(&first.arguments).unwrap();
        args.insert(BUTTON_LABEL_ARGUMENT.to_string(), json!(label));
        first.arguments = Value::Object(args).to_string();

        let expected: Vec<(String, String)> = calls
            .iter()
            .map(|c| (c.id.clone(), c.function.name.clone()))
            .collect();
        let response = OpenAIService::normalize_response(response_with(None, Some(calls))).unwrap();

        let got: Vec<(String, String)> = response
            .tool_calls
            .iter()
            .map(|c| (c.id.clone(), c.capability_name.clone()))
            .collect();
        prop_assert_eq!(got, expected);
        prop_assert!(response
            .tool_calls
            .iter()
            .all(|c| !c.arguments.contains_key(BUTTON_LABEL_ARGUMENT)));
        let trimmed = label.trim();
        let expected_label = if trimmed.is_empty() { None } else { Some(trimmed) };
        prop_assert_eq!(response.tool_calls[0].button_label.as_deref(), expected_label);
    }

    // Empty function names are always rejected
    #[test]
    fn prop_empty_name_rejected(call in arb_tool_call()) {
        let mut call = call;
        call.function.name = String::new();
        let result = OpenAIService::normalize_response(response_with(Some("hi".to_string()), Some(vec![call])));
        prop_assert!(result.is_err());
    }

    // Arguments that are not a JSON object are rejected
    #[test]
    fn prop_non_object_arguments_rejected(value in prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z]{1,10}".prop_map(|s| json!(s)),
        proptest::collection::vec(any::<bool>(), 0..4).prop_map(|v| json!(v)),
    ]) {
        let result = ToolInvocationRequest::decode("call_1", "navigate", value.to_string());
        prop_assert!(result.is_err());
    }

    // Text-only responses become plain replies
    #[test]
    fn prop_text_response_round_trips(text in "[a-zA-Z0-9 .!?]{1,80}") {
        let response = OpenAIService::normalize_response(response_with(Some(text.clone()), None)).unwrap();
        prop_assert_eq!(response.text.as_deref(), Some(text.as_str()));
        prop_assert!(!response.has_tool_calls());
        prop_assert_eq!(response.usage.input_tokens, 10);
    }
}

#[test]
fn test_empty_choices_rejected() {
    let response = OpenAIResponse {
        choices: vec![],
        usage: None,
    };
    assert!(OpenAIService::normalize_response(response).is_err());
}

#[test]
fn test_empty_message_rejected() {
    let result = OpenAIService::normalize_response(response_with(Some(String::new()), None));
    assert!(result.is_err());
}
