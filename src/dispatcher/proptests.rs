//! Property-based tests for the dispatcher
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::capabilities::{CapabilityKind, CapabilityRegistry, Route};
use crate::error::TurnError;
use crate::llm::{CompletionResult, LlmError, ToolInvocationRequest};
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// Test Helpers
// ============================================================================

const KNOWN: &[&str] = &["navigate", "_get_balance", "_get_name", "transfer"];

fn test_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry
        .register_attribute("balance", "$42", "Account balance")
        .unwrap();
    registry
        .register_attribute("name", "Ana", "User name")
        .unwrap();
    registry
        .register_action(
            "transfer",
            |_args| async { Ok(Value::Null) },
            "Transfer money",
            vec![],
            &[],
        )
        .unwrap();
    registry.register_navigation(vec![Route::new("home", "go to home")], |_dest| async {
        Ok(())
    });
    registry
}

fn request(index: usize, name: &str) -> ToolInvocationRequest {
    ToolInvocationRequest::decode(
        format!("call_{index}"),
        name,
        r#"{"destination":"home","buttonLabel":"Go"}"#,
    )
    .unwrap()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_known_name() -> impl Strategy<Value = String> {
    prop::sample::select(KNOWN).prop_map(str::to_string)
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_known_name(),
        1 => "[a-z]{3,10}".prop_map(|s| format!("unknown_{s}")),
    ]
}

fn arb_requests(names: impl Strategy<Value = String>) -> impl Strategy<Value = Vec<ToolInvocationRequest>> {
    proptest::collection::vec(names, 1..8).prop_map(|names| {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| request(i, name))
            .collect()
    })
}

fn arb_completion() -> impl Strategy<Value = CompletionResult> {
    prop_oneof![
        "[a-zA-Z ]{0,30}".prop_map(|text| CompletionResult::PlainReply { text }),
        arb_requests(arb_name()).prop_map(|requests| CompletionResult::ToolCalls { requests }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::UserMessage { text }),
        arb_completion().prop_map(Event::PrimaryCompleted),
        "[a-zA-Z ]{1,30}".prop_map(|text| Event::FeedbackCompleted { text }),
        Just(Event::CompletionFailed {
            error: LlmError::network("connection reset"),
        }),
        Just(Event::DataFetchFailed {
            error: crate::capabilities::CapabilityError::failed("boom"),
        }),
        Just(Event::Cancelled),
    ]
}

fn arb_busy_state() -> impl Strategy<Value = TurnState> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(|user_text| TurnState::AwaitingPrimaryCompletion { user_text }),
        ("[a-z ]{1,20}", arb_requests(arb_known_name())).prop_map(|(user_text, deferred)| {
            TurnState::AwaitingFeedbackCompletion {
                user_text,
                deferred,
            }
        }),
    ]
}

/// Effects that leave the dispatcher idle must end the turn, and effects that
/// leave it busy must request a completion
fn effects_match_state(effects: &[Effect], state: &TurnState) -> bool {
    match state {
        TurnState::Idle => !effects.iter().any(|e| {
            matches!(
                e,
                Effect::RequestPrimaryCompletion { .. } | Effect::RequestFeedback { .. }
            )
        }),
        TurnState::AwaitingPrimaryCompletion { .. } => {
            matches!(
                effects,
                [Effect::ClearPendingActions, Effect::RequestPrimaryCompletion { .. }]
            )
        }
        TurnState::AwaitingFeedbackCompletion { .. } => {
            matches!(effects, [Effect::RequestFeedback { .. }])
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Effects always agree with the state they lead to
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..20)) {
        let registry = test_registry();
        let mut state = TurnState::Idle;

        for event in events {
            if let Ok(result) = transition(&state, &registry, event) {
                prop_assert!(
                    effects_match_state(&result.effects, &result.new_state),
                    "Invalid effects for state {:?}: {:?}",
                    result.new_state,
                    result.effects
                );
                state = result.new_state;
            }
        }
    }

    // A turn in flight never accepts another user message
    #[test]
    fn prop_busy_rejects_messages(state in arb_busy_state(), text in "[a-zA-Z ]{0,30}") {
        let result = transition(&state, &test_registry(), Event::user_message(text));
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    // Blank input is a no-op
    #[test]
    fn prop_blank_message_has_no_effects(text in "[ \t\n]{0,10}") {
        let result = transition(&TurnState::Idle, &test_registry(), Event::user_message(text)).unwrap();
        prop_assert_eq!(result.new_state, TurnState::Idle);
        prop_assert!(result.effects.is_empty());
    }

    // Data fetches keep request order and never include confirmable actions
    #[test]
    fn prop_partition_preserves_order(requests in arb_requests(arb_known_name())) {
        let registry = test_registry();
        let state = TurnState::AwaitingPrimaryCompletion { user_text: "hi".to_string() };
        let event = Event::PrimaryCompleted(CompletionResult::ToolCalls { requests: requests.clone() });
        let result = transition(&state, &registry, event).unwrap();

        let [Effect::RequestFeedback { data_fetches, deferred, .. }] = result.effects.as_slice() else {
            return Err(TestCaseError::fail(format!("unexpected effects: {:?}", result.effects)));
        };

        let expected_fetches: Vec<&str> = requests
            .iter()
            .filter(|r| registry.classify(&r.capability_name) == Some(CapabilityKind::DataFetch))
            .map(|r| r.id.as_str())
            .collect();
        let expected_deferred: Vec<&str> = requests
            .iter()
            .filter(|r| registry.classify(&r.capability_name) == Some(CapabilityKind::ConfirmableAction))
            .map(|r| r.id.as_str())
            .collect();

        let fetches: Vec<&str> = data_fetches.iter().map(|r| r.id.as_str()).collect();
        let actions: Vec<&str> = deferred.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(fetches, expected_fetches);
        prop_assert_eq!(actions, expected_deferred);
    }

    // Any unknown capability fails the turn before anything runs
    #[test]
    fn prop_unknown_capability_fails_turn(
        requests in arb_requests(arb_known_name()),
        position in 0usize..8,
    ) {
        let mut requests = requests;
        let position = position.min(requests.len());
        requests.insert(position, request(99, "unknown_capability"));

        let state = TurnState::AwaitingPrimaryCompletion { user_text: "hi".to_string() };
        let event = Event::PrimaryCompleted(CompletionResult::ToolCalls { requests });
        let result = transition(&state, &test_registry(), event).unwrap();

        prop_assert_eq!(result.new_state, TurnState::Idle);
        let is_not_found = matches!(
            result.effects.as_slice(),
            [Effect::FailTurn { error: TurnError::CapabilityNotFound { .. }, .. }]
        );
        prop_assert!(is_not_found, "unexpected effects: {:?}", result.effects);
    }

    // Cancelling from any busy state returns to Idle and leaves the log alone
    #[test]
    fn prop_cancel_returns_to_idle(state in arb_busy_state()) {
        let result = transition(&state, &test_registry(), Event::Cancelled).unwrap();
        prop_assert_eq!(result.new_state, TurnState::Idle);
        prop_assert!(result.effects.is_empty());
    }

    // Every terminal transition out of a busy state ends the turn exactly once
    #[test]
    fn prop_turn_ends_once(state in arb_busy_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_registry(), event) {
            let terminal = result.effects.iter().filter(|e| e.is_terminal()).count();
            if result.new_state.is_idle() {
                prop_assert!(terminal <= 1);
            } else {
                prop_assert_eq!(terminal, 0);
            }
        }
    }
}
