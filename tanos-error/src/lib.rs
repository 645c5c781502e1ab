//! # tanos-error
//!
//! Unified error handling for TanOS.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: what went wrong (e.g., PromptNotFound, UnknownModule)
//! - **Context**: key/value pairs the boundary reads back for marker text
//! - **Source**: the wrapped underlying error, without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use tanos_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::PromptNotFound, "prompt 'ChartRoom/Plan.txt' not found")
//!         .with_operation("prompt::load")
//!         .with_context("module", "ChartRoom"))
//! }
//! ```
//!
//! ## Principles
//!
//! - Fallible functions return `Result<T, tanos_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - An error is handled once; callers further up only append context
//! - The interactive loop never hard-fails: stores recover locally and
//!   the orchestrator turns what remains into marker text

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using the TanOS Error
pub type Result<T> = std::result::Result<T, Error>;
