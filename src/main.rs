//! App Helper demo host
//!
//! Wires an assistant to a few sample capabilities and chats over stdin.
//! Type a message to start a turn, `!<n>` to run pending action `n`, and
//! `/quit` to leave.

use app_helper::capabilities::Arguments;
use app_helper::{
    ArgumentSpec, ArgumentType, Assistant, AssistantConfig, CapabilityRegistry, ProviderConfig,
    Role, Route,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app_helper=info,app_helper_demo=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let provider = ProviderConfig::from_env();
    let assistant = Assistant::from_provider(
        AssistantConfig::new("Helper"),
        demo_registry()?,
        &provider,
    )
    .inspect_err(|e| tracing::error!(error = %e, "Cannot start the demo assistant"))?;
    tracing::info!(
        model = %assistant.config().model.model,
        capabilities = assistant.registry().len(),
        "Demo assistant ready"
    );

    let name = assistant.config().name.clone();
    let mut shown = print_new(&assistant, &name, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }

        if let Some(index) = line.strip_prefix('!') {
            match index.trim().parse::<usize>() {
                Ok(n) if n >= 1 => match assistant.trigger_action(n - 1).await {
                    Ok(()) => println!("(action done)"),
                    Err(e) => println!("(action failed: {e})"),
                },
                _ => println!("Usage: !<number of a pending action>"),
            }
            continue;
        }

        if let Err(e) = assistant.submit_user_message(line).await {
            println!("(turn failed: {e})");
        }
        shown = print_new(&assistant, &name, shown);
    }

    Ok(())
}

fn demo_registry() -> Result<CapabilityRegistry, app_helper::RegistryError> {
    let mut registry = CapabilityRegistry::new();

    registry.register_attribute("balance", "$1,250.00", "The user's current account balance")?;
    registry.register_data(
        "recent_transactions",
        || async {
            Ok(json!([
                { "date": "2026-10-14", "description": "Coffee shop", "amount": -4.5 },
                { "date": "2026-10-15", "description": "Salary", "amount": 2100.0 },
            ]))
        },
        "The user's most recent transactions",
    )?;
    registry.register_action(
        "transfer",
        |args: Arguments| async move {
            println!("-> transfer {}", Value::Object(args));
            Ok(Value::Null)
        },
        "Transfer money from the user's account to a recipient",
        vec![
            ArgumentSpec::new("amount", ArgumentType::Number, "Amount to transfer"),
            ArgumentSpec::string("recipient", "Name of the recipient"),
        ],
        &["amount", "recipient"],
    )?;

    registry.register_navigation(
        vec![
            Route::new("home", "go to home"),
            Route::new("settings", "account and profile settings"),
            Route::new("cards", "manage debit and credit cards"),
        ],
        |destination| async move {
            println!("-> navigate to {destination}");
            Ok(())
        },
    );

    Ok(registry)
}

/// Print assistant messages after `shown` and the pending actions; returns the
/// new message count
fn print_new(assistant: &Assistant, name: &str, shown: usize) -> usize {
    let messages = assistant.messages();
    for message in messages.iter().skip(shown) {
        if message.role == Role::Assistant {
            println!("{name}: {}", message.text());
        }
    }

    for (i, action) in assistant.pending_actions().iter().enumerate() {
        println!("  [!{}] {}", i + 1, action.label());
    }

    messages.len()
}
