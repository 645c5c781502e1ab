//! Error kinds for TanOS operations

use std::fmt;

/// What went wrong.
///
/// Callers match on the kind to pick a fallback: a missing resource is
/// replaced by a default, an unknown module key becomes marker text, a
/// failed write is logged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Settings or provider configuration cannot be used
    ConfigInvalid,

    /// No prompt template exists for the (module, filename) key
    PromptNotFound,
    /// The module key is not one of the five TanOS modules
    UnknownModule,

    /// A document could not be encoded for writing
    SerializationFailed,
    /// A document on disk (or a provider reply) could not be decoded
    ParseFailed,

    FileNotFound,
    PermissionDenied,
    IoFailed,

    /// The completion backend answered with an error
    InferenceFailed,
    /// The completion backend could not be set up
    ProviderUnavailable,
    RateLimited,
    AuthenticationFailed,
    NetworkFailed,

    /// A caller passed a value the operation refuses
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::PromptNotFound => "PromptNotFound",
            ErrorKind::UnknownModule => "UnknownModule",
            ErrorKind::SerializationFailed => "SerializationFailed",
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::InvalidArgument => "InvalidArgument",
        }
    }

    /// The "resource is absent" family that stores recover from by
    /// substituting a default.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ErrorKind::FileNotFound | ErrorKind::PromptNotFound)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
