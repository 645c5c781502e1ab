//! # TanOS Core
//!
//! The stores behind a personal copilot shell.
//!
//! ## Core Concepts
//! - **Prompts**: Read-only templates per module, cached after the first load
//! - **Memories**: Structured preference documents, read-mostly, with path lookup
//! - **Operational State**: The single mutable session document, saved on every change
//! - **Changelog**: Newest-first version entries for the Nomad persona
//! - **Provider**: Trait-based LLM communication (mock, OpenAI-compatible)

pub mod changelog;
pub mod config;
pub mod error;
pub mod memory;
pub mod module;
pub mod prompt;
pub mod provider;
pub mod state;
pub mod storage;

pub use changelog::{format_draft, next_version, ChangelogEntry, ChangelogStore};
pub use config::{ProviderKind, Settings};
pub use error::{Error, ErrorKind, Result};
pub use memory::{
    MemorySuggestion, MemoryStore, PathSegment, COGNITIVE_PREFERENCES_KEY, CORE_IDENTITY_KEY,
    CORE_MEMORY_KEYS, GROWTH_GOALS_KEY,
};
pub use module::{Module, TOOLS_MODULE};
pub use prompt::PromptStore;
pub use provider::{
    AnyProvider, ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    MockProvider, OpenAIProvider, ProviderConfig, Role, Usage,
};
pub use state::{
    Insight, OperationalState, OperationalStateStore, PendingDecision, Project,
    MAX_RECENT_INSIGHTS,
};
