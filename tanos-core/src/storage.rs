//! # Document Storage
//!
//! Whole-file JSON/YAML documents on disk. Every persisted store in TanOS
//! (operational state, changelog, memories, suggestions) goes through these
//! helpers so that a read always reports *why* it failed:
//!
//! - `FileNotFound` - the document does not exist yet
//! - `ParseFailed`  - the bytes are there but do not decode
//! - `IoFailed` / `PermissionDenied` - the filesystem refused
//!
//! Writes always replace the full document. There is no locking: a single
//! process is assumed to own the data directory.

use crate::error::{self, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// On-disk encoding of a document, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// No recognised extension: try JSON first, then YAML
    Unknown,
}

impl DocumentFormat {
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => DocumentFormat::Json,
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Unknown,
        }
    }
}

/// Read a file to a string, mapping `NotFound` to `FileNotFound`.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        tanos_error::Error::from(e)
            .with_operation("storage::read_text")
            .with_context("path", path.display().to_string())
    })
}

/// Read and decode a document, choosing the decoder from the extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_text(path)?;
    decode(path, &content)
}

/// Decode `content` that was read from `path`.
pub fn decode<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    match DocumentFormat::detect(path) {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|e| error::parse_error(path, e))
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| error::parse_error(path, e))
        }
        DocumentFormat::Unknown => match serde_json::from_str(content) {
            Ok(value) => Ok(value),
            Err(json_err) => serde_yaml::from_str(content).map_err(|yaml_err| {
                error::parse_error(path, format!("json: {}; yaml: {}", json_err, yaml_err))
            }),
        },
    }
}

/// Serialize `value` as pretty JSON (4-space indent) and overwrite `path`,
/// creating parent directories as needed.
pub fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| error::serialization_error(e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                error::io_error(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    std::fs::write(path, buf)
        .map_err(|e| error::io_error(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}
