//! # LLM Provider Interface
//!
//! A trait-based abstraction over the completion backend.
//!
//! ## Design
//! - `LlmProvider` defines the core interface; `send_prompt` is the one call
//!   the orchestrator makes
//! - `MockProvider` is the default backend and records every request
//! - `OpenAIProvider` talks to any OpenAI-compatible endpoint, Ollama included
//! - `AnyProvider` picks one at runtime from `Settings`

pub mod mock;
pub mod openai;

pub use mock::MockProvider;
pub use openai::OpenAIProvider;

use crate::config::{ProviderKind, Settings, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Heading of the system message that carries the compiled context.
pub const CONTEXT_HEADING: &str = "Relevant Context for this interaction:\n";

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion. Unset sampling fields fall back to
/// the provider's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Build the standard three-part request: system prompt, optional
    /// context as a second system message, then the user prompt.
    pub fn from_prompts(system: &str, user: &str, context: Option<&str>) -> Self {
        let mut messages = vec![ChatMessage::system(system)];
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            messages.push(ChatMessage::system(format!("{}{}", CONTEXT_HEADING, context)));
        }
        messages.push(ChatMessage::user(user));
        Self::new(messages)
    }

    /// First system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Context carried by a later system message, without its heading.
    pub fn context(&self) -> Option<&str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .find_map(|m| m.content.strip_prefix(CONTEXT_HEADING))
    }

    /// Last user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "mock", "openai")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// System prompt + user prompt + optional context -> response text.
    ///
    /// Never fails: any error comes back as an `[Error: ...]` marker.
    async fn send_prompt(&self, system: &str, user: &str, context: Option<&str>) -> String {
        debug!(provider = self.name(), user_prompt = user, "sending prompt");
        let request = CompletionRequest::from_prompts(system, user, context);

        match self.complete(request).await {
            Ok(CompletionResponse {
                content: Some(text), ..
            }) => text.trim().to_string(),
            Ok(_) => {
                warn!(provider = self.name(), "completion returned no content");
                format!("[Error: No content in response from {}]", self.name())
            }
            Err(e) => {
                warn!(provider = self.name(), error = %e, "completion failed");
                format!(
                    "[Error: Could not get response from {}: {}]",
                    self.name(),
                    e.message()
                )
            }
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl ProviderConfig {
    pub fn mock() -> Self {
        Self {
            kind: ProviderKind::Mock,
            api_key: None,
            base_url: String::new(),
            default_model: "mock".into(),
            timeout_secs: 0,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAI,
            api_key: Some(api_key.into()),
            base_url: "https://api.openai.com/v1".into(),
            default_model: "gpt-4o".into(),
            timeout_secs: 120,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Ollama through its OpenAI-compatible `/v1` endpoint.
    pub fn ollama(base_url: &str, model: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Ollama,
            api_key: None,
            base_url: format!("{}/v1", base_url.trim_end_matches('/')),
            default_model: model.into(),
            timeout_secs: 300,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = match settings.provider {
            ProviderKind::Mock => Self::mock(),
            ProviderKind::OpenAI => {
                let key = settings.openai_api_key.clone().ok_or_else(|| {
                    error::config_invalid("OPENAI_API_KEY must be set for the openai provider")
                })?;
                let mut config = Self::openai(key).with_model(&settings.openai_model);
                config.base_url = settings.openai_base_url.trim_end_matches('/').to_string();
                config
            }
            ProviderKind::Ollama => Self::ollama(&settings.ollama_base_url, &settings.ollama_model),
        };
        Ok(config.with_sampling(settings.max_tokens, settings.temperature))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_sampling(mut self, max_tokens: usize, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// Runtime-selected provider.
pub enum AnyProvider {
    Mock(MockProvider),
    OpenAI(OpenAIProvider),
}

impl AnyProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = ProviderConfig::from_settings(settings)?;
        match config.kind {
            ProviderKind::Mock => Ok(AnyProvider::Mock(MockProvider::new())),
            ProviderKind::OpenAI | ProviderKind::Ollama => {
                Ok(AnyProvider::OpenAI(OpenAIProvider::new(config)?))
            }
        }
    }
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            AnyProvider::Mock(p) => p.name(),
            AnyProvider::OpenAI(p) => p.name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            AnyProvider::Mock(p) => p.default_model(),
            AnyProvider::OpenAI(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        match self {
            AnyProvider::Mock(p) => p.complete(request).await,
            AnyProvider::OpenAI(p) => p.complete(request).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
