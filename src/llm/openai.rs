//! `OpenAI` and `OpenAI`-compatible chat completions provider

use super::types::{ConversationMessage, LlmRequest, LlmResponse, ToolInvocationRequest, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completions service for `OpenAI` or any compatible endpoint
pub struct OpenAIService {
    client: Client,
    api_key: String,
    endpoint: String,
    service_id: String,
}

impl OpenAIService {
    /// Create a service. `base_url` defaults to the public `OpenAI` API and
    /// may point at any compatible provider (e.g. `http://localhost:11434/v1`).
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>) -> Result<Self, LlmError> {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let endpoint = format!("{base}/chat/completions");

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            service_id: format!("openai-compatible@{base}"),
            endpoint,
        })
    }

    pub(super) fn translate_request(request: &LlmRequest) -> OpenAIRequest {
        let settings = &request.settings;

        let messages = request
            .messages
            .iter()
            .map(OpenAIMessage::from_conversation)
            .collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| OpenAITool {
                        r#type: "function".to_string(),
                        function: OpenAIFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.clone(),
                        },
                    })
                    .collect(),
            )
        };

        // Reasoning models reject sampling parameters and use max_completion_tokens
        if uses_max_completion_tokens(&settings.model) {
            OpenAIRequest {
                model: settings.model.clone(),
                messages,
                tools,
                max_tokens: None,
                max_completion_tokens: Some(settings.max_tokens),
                temperature: None,
                top_p: None,
                frequency_penalty: None,
                presence_penalty: None,
                stream: false,
            }
        } else {
            OpenAIRequest {
                model: settings.model.clone(),
                messages,
                tools,
                max_tokens: Some(settings.max_tokens),
                max_completion_tokens: None,
                temperature: Some(settings.temperature),
                top_p: Some(settings.top_p),
                frequency_penalty: Some(settings.frequency_penalty),
                presence_penalty: Some(settings.presence_penalty),
                stream: false,
            }
        }
    }

    pub(super) fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("No choices in response"))?;

        let text = choice.message.content.filter(|t| !t.is_empty());

        let mut tool_calls = Vec::new();
        for tc in choice.message.tool_calls.unwrap_or_default() {
            if tc.function.name.is_empty() {
                return Err(LlmError::invalid_response(format!(
                    "Tool call '{}' has an empty function name",
                    tc.id
                )));
            }
            tool_calls.push(ToolInvocationRequest::decode(
                tc.id,
                tc.function.name,
                tc.function.arguments,
            )?);
        }

        if text.is_none() && tool_calls.is_empty() {
            return Err(LlmError::invalid_response(
                "Response has neither content nor tool calls",
            ));
        }

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse {
            text,
            tool_calls,
            usage,
        })
    }
}

/// Models that use `max_completion_tokens` instead of `max_tokens`
fn uses_max_completion_tokens(model: &str) -> bool {
    ["o1", "o3", "o4", "gpt-5"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let openai_request = Self::translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
                .map_or(body, |error_resp| error_resp.error.message);
            let error = LlmError::from_status(status.as_u16(), &message);
            return Err(match retry_after {
                Some(delay) => error.with_retry_after(delay),
                None => error,
            });
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::invalid_response(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.service_id
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
pub(super) struct OpenAIRequest {
    pub(super) model: String,
    pub(super) messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) presence_penalty: Option<f32>,
    pub(super) stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct OpenAIMessage {
    pub(super) role: String,
    #[serde(default)]
    pub(super) content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) tool_calls: Option<Vec<OpenAIToolCall>>,
}

impl OpenAIMessage {
    fn from_conversation(msg: &ConversationMessage) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
            tool_calls: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OpenAITool {
    pub(super) r#type: String,
    pub(super) function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
pub(super) struct OpenAIFunction {
    pub(super) name: String,
    pub(super) description: String,
    pub(super) parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct OpenAIToolCall {
    pub(super) id: String,
    pub(super) r#type: String,
    pub(super) function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct OpenAIFunctionCall {
    pub(super) name: String,
    pub(super) arguments: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIResponse {
    pub(super) choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub(super) usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIChoice {
    pub(super) message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
pub(super) struct OpenAIUsage {
    pub(super) prompt_tokens: u32,
    pub(super) completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
