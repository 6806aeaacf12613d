//! Assistant configuration
//!
//! `AssistantConfig` is fixed once an `Assistant` is built. `ProviderConfig`
//! carries the connection details and is read from the environment by hosts
//! that do not wire it themselves.

use serde::{Deserialize, Serialize};

/// Sampling settings sent with every completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

impl ModelSettings {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

/// Which settings the feedback (summary) completion uses
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "settings", rename_all = "snake_case")]
pub enum FeedbackModel {
    #[default]
    SameAsPrimary,
    Custom(ModelSettings),
}

/// Colour palette handed through to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub chat: ChatTheme,
    pub bubble: BubbleTheme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatTheme {
    pub header: String,
    pub header_text: String,
    pub background: String,
    pub text_left: String,
    pub text_right: String,
    pub message_bubble_left: String,
    pub message_bubble_right: String,
    pub text_field_background: String,
    pub text_field_color: String,
    pub message_action_wrapper: String,
    pub message_action_text: String,
    pub bottom_wrapper: String,
}

impl Default for ChatTheme {
    fn default() -> Self {
        Self {
            header: "#2f2f2f".to_string(),
            header_text: "#ffffff".to_string(),
            background: "#2f2f2f".to_string(),
            text_left: "#2f2f2f".to_string(),
            text_right: "#ffffff".to_string(),
            message_bubble_left: "#dbdbdb".to_string(),
            message_bubble_right: "#010238".to_string(),
            text_field_background: "#ffffff".to_string(),
            text_field_color: "#000000".to_string(),
            message_action_wrapper: "#010238".to_string(),
            message_action_text: "#ffffff".to_string(),
            bottom_wrapper: "#2f2f2f".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleTheme {
    pub background: String,
    pub icon: String,
}

impl Default for BubbleTheme {
    fn default() -> Self {
        Self {
            background: "#010238".to_string(),
            icon: "#ffffff".to_string(),
        }
    }
}

const DEFAULT_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while handling your message. Please try again.";

/// Immutable assistant configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    /// Language every reply must be written in
    pub language: String,
    pub avatar: Option<String>,
    pub theme: Theme,
    pub model: ModelSettings,
    pub feedback_model: FeedbackModel,
    /// Opening assistant message; a greeting mentioning `name` when unset
    pub first_message: Option<String>,
    /// Assistant notice appended when a turn fails
    pub failure_message: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Helper".to_string(),
            language: "English".to_string(),
            avatar: None,
            theme: Theme::default(),
            model: ModelSettings::default(),
            feedback_model: FeedbackModel::SameAsPrimary,
            first_message: None,
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl AssistantConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: ModelSettings) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_feedback_model(mut self, feedback_model: FeedbackModel) -> Self {
        self.feedback_model = feedback_model;
        self
    }

    #[must_use]
    pub fn with_first_message(mut self, first_message: impl Into<String>) -> Self {
        self.first_message = Some(first_message.into());
        self
    }

    #[must_use]
    pub fn with_failure_message(mut self, failure_message: impl Into<String>) -> Self {
        self.failure_message = failure_message.into();
        self
    }

    /// Settings used for the feedback completion
    pub fn feedback_settings(&self) -> &ModelSettings {
        match &self.feedback_model {
            FeedbackModel::SameAsPrimary => &self.model,
            FeedbackModel::Custom(settings) => settings,
        }
    }
}

/// Provider connection and assistant overrides taken from the environment
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub feedback_model: Option<String>,
    pub language: Option<String>,
    pub name: Option<String>,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_var("OPENAI_API_KEY"),
            base_url: non_empty_var("OPENAI_BASE_URL"),
            model: non_empty_var("APP_HELPER_MODEL"),
            feedback_model: non_empty_var("APP_HELPER_FEEDBACK_MODEL"),
            language: non_empty_var("APP_HELPER_LANGUAGE"),
            name: non_empty_var("APP_HELPER_NAME"),
        }
    }

    /// Apply the overrides on top of `base`
    pub fn apply(&self, mut base: AssistantConfig) -> AssistantConfig {
        if let Some(name) = &self.name {
            base.name.clone_from(name);
        }
        if let Some(language) = &self.language {
            base.language.clone_from(language);
        }
        if let Some(model) = &self.model {
            base.model.model.clone_from(model);
        }
        if let Some(model) = &self.feedback_model {
            let mut settings = base.model.clone();
            settings.model.clone_from(model);
            base.feedback_model = FeedbackModel::Custom(settings);
        }
        base
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
