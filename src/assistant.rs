//! Assistant runtime
//!
//! Owns the registry, completion client and conversation of one embedded
//! assistant, and executes the effects the dispatcher asks for. One turn runs
//! at a time; the presentation layer reads snapshots through the accessors.

use crate::capabilities::CapabilityRegistry;
use crate::config::{AssistantConfig, ProviderConfig};
use crate::conversation::{Conversation, PendingAction};
use crate::dispatcher::{transition, Effect, Event, TurnState};
use crate::error::{ActionError, TurnError};
use crate::llm::{
    ConversationMessage, LlmError, LlmRequest, LlmResponse, LlmService, LoggingService,
    OpenAIService, ToolInvocationRequest,
};
use crate::prompt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;


/// An embedded conversational helper
///
/// Lock order is `state`, then `active_turn`, then `conversation`.
pub struct Assistant {
    config: AssistantConfig,
    system_prompt: String,
    registry: Arc<CapabilityRegistry>,
    llm: Arc<dyn LlmService>,
    conversation: Mutex<Conversation>,
    state: Mutex<TurnState>,
    active_turn: Mutex<Option<ActiveTurn>>,
    next_turn_id: AtomicU64,
}

/// The turn currently in flight
#[derive(Debug)]
struct ActiveTurn {
    id: u64,
    token: CancellationToken,
}

impl Assistant {
    pub fn new(
        config: AssistantConfig,
        registry: CapabilityRegistry,
        llm: Arc<dyn LlmService>,
    ) -> Self {
        let system_prompt = prompt::build_system_prompt(&config);
        let conversation = Conversation::new(prompt::greeting(&config));
        tracing::info!(
            name = %config.name,
            language = %config.language,
            model = %config.model.model,
            feedback_model = %config.feedback_settings().model,
            capabilities = registry.len(),
            navigation = registry.has_navigation(),
            "Assistant created"
        );

        Self {
            config,
            system_prompt,
            registry: Arc::new(registry),
            llm: Arc::new(LoggingService::new(llm)),
            conversation: Mutex::new(conversation),
            state: Mutex::new(TurnState::Idle),
            active_turn: Mutex::new(None),
            next_turn_id: AtomicU64::new(0),
        }
    }

    /// Build an assistant talking to an `OpenAI`-compatible endpoint, with the
    /// provider's overrides applied to `config`
    pub fn from_provider(
        config: AssistantConfig,
        registry: CapabilityRegistry,
        provider: &ProviderConfig,
    ) -> Result<Self, LlmError> {
        let api_key = provider
            .api_key
            .clone()
            .ok_or_else(|| LlmError::auth("No API key configured (OPENAI_API_KEY)"))?;
        let service = OpenAIService::new(api_key, provider.base_url.as_deref())?;
        Ok(Self::new(provider.apply(config), registry, Arc::new(service)))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Snapshot of the message log
    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.conversation.lock().messages().to_vec()
    }

    /// Snapshot of the current pending actions
    pub fn pending_actions(&self) -> Vec<PendingAction> {
        self.conversation.lock().pending_actions().to_vec()
    }

    /// A turn is in flight; hosts disable input while this holds
    pub fn is_busy(&self) -> bool {
        self.state.lock().is_busy()
    }

    pub fn turn_state(&self) -> TurnState {
        self.state.lock().clone()
    }

    /// Process one user message through to a committed reply.
    ///
    /// Blank input is ignored. A message sent while another turn is in flight
    /// is rejected with `TurnError::Busy` and changes nothing.
    pub async fn submit_user_message(&self, text: &str) -> Result<(), TurnError> {
        let (effects, token, turn_id) = {
            let mut state = self.state.lock();
            let result = transition(&state, &self.registry, Event::user_message(text))?;
            if result.effects.is_empty() {
                tracing::debug!("Ignoring blank user message");
                return Ok(());
            }
            *state = result.new_state;

            let id = self.next_turn_id.fetch_add(1, Ordering::SeqCst);
            let token = CancellationToken::new();
            *self.active_turn.lock() = Some(ActiveTurn {
                id,
                token: token.clone(),
            });
            (result.effects, token, id)
        };

        let _guard = TurnGuard {
            assistant: self,
            turn_id,
        };
        tracing::info!(turn_id, chars = text.chars().count(), "Turn started");
        self.run_turn(effects, &token).await
    }

    /// Cancel the turn in flight. Returns false when there is none.
    pub fn cancel_turn(&self) -> bool {
        match self.active_turn.lock().as_ref() {
            Some(turn) => {
                tracing::info!(turn_id = turn.id, "Cancelling turn");
                turn.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run the pending action at `index`, then clear the pending set unless a
    /// newer batch replaced it meanwhile. A failed invocation leaves the set in
    /// place so the user can retry. The message log is never touched.
    pub async fn trigger_action(&self, index: usize) -> Result<(), ActionError> {
        let action = self
            .conversation
            .lock()
            .pending_actions()
            .get(index)
            .cloned()
            .ok_or(ActionError::NoSuchAction { index })?;

        tracing::info!(
            label = %action.label(),
            capability = %action.capability_name(),
            "Triggering pending action"
        );
        action.invoke().await?;
        self.conversation.lock().clear_pending_batch(action.batch());
        Ok(())
    }

    /// Drop every pending action, for hosts that invoke actions themselves
    pub fn clear_pending_actions(&self) {
        self.conversation.lock().clear_pending();
    }

    async fn run_turn(&self, effects: Vec<Effect>, token: &CancellationToken) -> Result<(), TurnError> {
        let mut queue = VecDeque::from(effects);
        let mut outcome = Ok(());

        while let Some(effect) = queue.pop_front() {
            match self.execute_effect(effect, token).await {
                Ok(Some(event)) => {
                    let cancelled = matches!(event, Event::Cancelled);
                    queue.extend(self.apply(event)?);
                    if cancelled {
                        tracing::info!("Turn cancelled, conversation left unchanged");
                        return Err(TurnError::Cancelled);
                    }
                }
                Ok(None) => {}
                Err(error) => outcome = Err(error),
            }
        }

        outcome
    }

    /// Feed an event through the dispatcher and return the effects to run
    fn apply(&self, event: Event) -> Result<Vec<Effect>, TurnError> {
        let mut state = self.state.lock();
        let result = transition(&state, &self.registry, event)?;
        tracing::debug!(
            from = state.name(),
            to = result.new_state.name(),
            effects = result.effects.len(),
            "Turn state changed"
        );
        *state = result.new_state;
        Ok(result.effects)
    }

    async fn execute_effect(
        &self,
        effect: Effect,
        token: &CancellationToken,
    ) -> Result<Option<Event>, TurnError> {
        match effect {
            Effect::RequestPrimaryCompletion { user_text } => {
                let history = self.messages();
                let request = LlmRequest {
                    messages: prompt::compose_messages(&self.system_prompt, &history, &user_text),
                    tools: self.registry.tool_definitions(),
                    settings: self.config.model.clone(),
                };
                Ok(Some(match self.complete(&request, token).await {
                    Some(Ok(response)) => Event::PrimaryCompleted(response.into_completion()),
                    Some(Err(error)) => Event::CompletionFailed { error },
                    None => Event::Cancelled,
                }))
            }

            Effect::RequestFeedback {
                user_text,
                data_fetches,
                deferred,
            } => Ok(Some(
                self.request_feedback(&user_text, data_fetches, &deferred, token)
                    .await,
            )),

            Effect::CommitTurn { user_text, reply } => {
                self.conversation.lock().commit_turn(&user_text, &reply);
                tracing::info!("Turn committed");
                Ok(None)
            }

            Effect::InstallPendingActions { deferred } => {
                self.conversation
                    .lock()
                    .install_pending(&self.registry, deferred);
                Ok(None)
            }

            Effect::ClearPendingActions => {
                self.conversation.lock().clear_pending();
                Ok(None)
            }

            Effect::FailTurn { user_text, error } => {
                tracing::error!(error = %error, kind = error.kind(), "Turn failed");
                let mut conversation = self.conversation.lock();
                conversation.commit_turn(&user_text, &self.config.failure_message);
                conversation.clear_pending();
                Err(error)
            }
        }
    }

    /// Run the data fetches in request order, then ask for the summary
    async fn request_feedback(
        &self,
        user_text: &str,
        data_fetches: Vec<ToolInvocationRequest>,
        deferred: &[ToolInvocationRequest],
        token: &CancellationToken,
    ) -> Event {
        let mut user_data: Vec<Value> = Vec::with_capacity(data_fetches.len());
        for request in data_fetches {
            let fetched = tokio::select! {
                biased;
                () = token.cancelled() => return Event::Cancelled,
                result = self.registry.invoke(&request.capability_name, request.arguments) => result,
            };
            match fetched {
                Ok(value) => user_data.push(value),
                Err(error) => return Event::DataFetchFailed { error },
            }
        }

        tracing::debug!(
            data = user_data.len(),
            deferred = deferred.len(),
            "Requesting feedback completion"
        );
        let feedback_prompt =
            prompt::build_feedback_prompt(&user_data, deferred, &self.config.language);
        let request = LlmRequest {
            messages: prompt::compose_feedback_messages(&feedback_prompt, user_text),
            tools: Vec::new(),
            settings: self.config.feedback_settings().clone(),
        };

        match self.complete(&request, token).await {
            Some(Ok(response)) => Event::FeedbackCompleted {
                text: response.text.unwrap_or_default(),
            },
            Some(Err(error)) => Event::CompletionFailed { error },
            None => Event::Cancelled,
        }
    }

    /// Race a completion against the turn's cancellation. `None` means cancelled.
    async fn complete(
        &self,
        request: &LlmRequest,
        token: &CancellationToken,
    ) -> Option<Result<LlmResponse, LlmError>> {
        tokio::select! {
            biased;
            () = token.cancelled() => None,
            result = self.llm.complete(request) => Some(result),
        }
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("model_id", &self.llm.model_id())
            .finish_non_exhaustive()
    }
}

/// Returns the assistant to `Idle` when a turn ends, including when the
/// caller drops the turn future mid-flight. A guard whose turn was already
/// succeeded by a newer one leaves that turn alone.
struct TurnGuard<'a> {
    assistant: &'a Assistant,
    turn_id: u64,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.assistant.state.lock();
        let mut active = self.assistant.active_turn.lock();
        if active.as_ref().map(|turn| turn.id) != Some(self.turn_id) {
            return;
        }

        *active = None;
        if state.is_busy() {
            tracing::warn!(
                turn_id = self.turn_id,
                state = state.name(),
                "Turn abandoned before completion"
            );
            *state = TurnState::Idle;
        }
    }
}
