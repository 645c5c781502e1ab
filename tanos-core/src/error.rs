//! TanOS core error types
//!
//! Re-exports tanos-error and provides store-specific conveniences.

pub use tanos_error::{Error, ErrorKind, Result};

// =============================================================================
// Store-specific error constructors
// =============================================================================

/// Create a PromptNotFound error
pub fn prompt_not_found(module: impl Into<String>, filename: impl Into<String>) -> Error {
    Error::prompt_not_found(module, filename)
}

/// Create an UnknownModule error
pub fn unknown_module(key: impl Into<String>) -> Error {
    Error::unknown_module(key)
}

/// Create a ParseFailed error for a document on disk
pub fn parse_error(path: &std::path::Path, reason: impl std::fmt::Display) -> Error {
    Error::parse_failed(format!("failed to decode {}: {}", path.display(), reason))
        .with_context("path", path.display().to_string())
}

/// Create a SerializationFailed error
pub fn serialization_error(message: impl Into<String>) -> Error {
    Error::serialization_failed(message)
}

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::io_failed(message)
}

/// Create an InvalidArgument error
pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::invalid_argument(message)
}

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::config_invalid(message)
}

/// Create an InferenceFailed error
pub fn inference_failed(reason: impl Into<String>) -> Error {
    Error::inference_failed(reason)
}

/// Create a NetworkFailed error
pub fn network_failed(reason: impl Into<String>) -> Error {
    Error::new(ErrorKind::NetworkFailed, reason)
}

/// Create a RateLimited error
pub fn rate_limited() -> Error {
    Error::new(ErrorKind::RateLimited, "provider rate limit exceeded")
}

/// Create an AuthenticationFailed error
pub fn authentication_failed(provider: &str) -> Error {
    Error::new(ErrorKind::AuthenticationFailed, "provider rejected credentials")
        .with_context("provider", provider.to_string())
}
