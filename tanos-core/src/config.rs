//! Runtime settings: where prompts and data live, and which provider to use.

use crate::error::{self, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_PROMPTS_DIR: &str = "tanos_prompts";
pub const DEFAULT_DATA_DIR: &str = "tanos_data";
pub const DEFAULT_MAX_TOKENS: usize = 2000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const STATE_FILE: &str = "captains_log_state.json";
const CHANGELOG_FILE: &str = "nomad_changelog.json";
const SUGGESTIONS_FILE: &str = "suggestions.json";

/// Which completion backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Mock,
    OpenAI,
    /// Ollama through its OpenAI-compatible endpoint
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = tanos_error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "openai" => Ok(ProviderKind::OpenAI),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(error::config_invalid(format!("Unsupported LLM provider: {}", other))
                .with_context("provider", other.to_string())),
        }
    }
}

/// Settings for one TanOS process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub prompts_dir: PathBuf,
    pub data_dir: PathBuf,
    pub provider: ProviderKind,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompts_dir: PathBuf::from(DEFAULT_PROMPTS_DIR),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            provider: ProviderKind::Mock,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".into(),
            openai_model: "gpt-4o".into(),
            ollama_base_url: "http://localhost:11434".into(),
            ollama_model: "llama3".into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Settings {
    /// Build settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("TANOS_PROMPTS_DIR") {
            settings.prompts_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("TANOS_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(provider) = get("LLM_PROVIDER") {
            settings.provider = provider.parse()?;
        }
        settings.openai_api_key = get("OPENAI_API_KEY");
        if let Some(url) = get("OPENAI_BASE_URL") {
            settings.openai_base_url = url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            settings.openai_model = model;
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            settings.ollama_base_url = url;
        }
        if let Some(model) = get("OLLAMA_MODEL_NAME") {
            settings.ollama_model = model;
        }
        if let Some(raw) = get("TANOS_MAX_TOKENS") {
            settings.max_tokens = raw.trim().parse().map_err(|_| {
                error::config_invalid(format!("TANOS_MAX_TOKENS is not an integer: {}", raw))
            })?;
        }
        if let Some(raw) = get("TANOS_TEMPERATURE") {
            settings.temperature = raw.trim().parse().map_err(|_| {
                error::config_invalid(format!("TANOS_TEMPERATURE is not a number: {}", raw))
            })?;
        }
        Ok(settings)
    }

    pub fn with_prompts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.prompts_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn memories_dir(&self) -> PathBuf {
        self.data_dir.join("memories")
    }

    pub fn operational_state_dir(&self) -> PathBuf {
        self.data_dir.join("operational_state")
    }

    pub fn changelogs_dir(&self) -> PathBuf {
        self.data_dir.join("changelogs")
    }

    pub fn state_file(&self) -> PathBuf {
        self.operational_state_dir().join(STATE_FILE)
    }

    pub fn changelog_file(&self) -> PathBuf {
        self.changelogs_dir().join(CHANGELOG_FILE)
    }

    pub fn suggestions_file(&self) -> PathBuf {
        self.memories_dir().join(SUGGESTIONS_FILE)
    }

    /// Create the data directories if they do not exist.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [
            self.memories_dir(),
            self.operational_state_dir(),
            self.changelogs_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                error::io_error(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }
}
