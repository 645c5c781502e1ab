//! # Memory Store
//!
//! Structured preference documents ("memories") about the user, one file
//! per key under the memories directory: `<key>.json`, `<key>.yaml`,
//! `<key>.yml` or a bare `<key>` (tried as JSON, then YAML).
//!
//! Memories are read-mostly. TanOS never edits a memory file on its own:
//! [`MemoryStore::suggest_update`] only records a suggestion for the user
//! to apply by hand.

use crate::error::Result;
use crate::storage;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const CORE_IDENTITY_KEY: &str = "tan_core_identity_values";
pub const GROWTH_GOALS_KEY: &str = "tan_growth_plan_goals";
pub const COGNITIVE_PREFERENCES_KEY: &str = "tan_cognitive_os_preferences";

/// Memories that every interaction context includes.
pub const CORE_MEMORY_KEYS: [&str; 3] = [
    CORE_IDENTITY_KEY,
    GROWTH_GOALS_KEY,
    COGNITIVE_PREFERENCES_KEY,
];

const MEMORY_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// One step of a path into a memory document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Split `a/b/0` into segments; all-digit parts become indices.
    pub fn parse_path(path: &str) -> Vec<PathSegment> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(part.to_string()),
            })
            .collect()
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

fn render_path(path: &[PathSegment], sep: &str) -> String {
    path.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Walk `path` into `value`. Missing keys, out-of-range indices and
/// indexing into the wrong kind of value all yield `None`.
pub fn lookup<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match (segment, current) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key),
        (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
        _ => None,
    })
}

/// A proposed change to a memory document, waiting for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySuggestion {
    pub memory_key: String,
    pub target_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Vec<PathSegment>>,
    pub description: String,
    pub suggested_at: DateTime<Local>,
}

pub struct MemoryStore {
    memories_dir: PathBuf,
    cache: HashMap<String, Value>,
    suggestions: Vec<MemorySuggestion>,
    suggestion_log: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(memories_dir: impl AsRef<Path>) -> Self {
        Self {
            memories_dir: memories_dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
            suggestions: Vec::new(),
            suggestion_log: None,
        }
    }

    /// Also append every suggestion to a JSON file for later review.
    pub fn with_suggestion_log(mut self, path: impl AsRef<Path>) -> Self {
        self.suggestion_log = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn memories_dir(&self) -> &Path {
        &self.memories_dir
    }

    /// Path of the file backing `key`. When no file exists yet this is the
    /// `.json` path a new document would be written to.
    pub fn memory_path(&self, key: &str) -> PathBuf {
        MEMORY_EXTENSIONS
            .iter()
            .map(|ext| self.memories_dir.join(format!("{}.{}", key, ext)))
            .chain(std::iter::once(self.memories_dir.join(key)))
            .find(|p| p.is_file())
            .unwrap_or_else(|| self.memories_dir.join(format!("{}.json", key)))
    }

    /// Write placeholder documents for the core memories that do not exist.
    /// Returns the keys that were created.
    pub fn ensure_core_memories(&self) -> Result<Vec<String>> {
        let mut created = Vec::new();
        for key in CORE_MEMORY_KEYS {
            let path = self.memory_path(key);
            if path.exists() {
                continue;
            }
            let placeholder = serde_json::json!({
                "placeholder_data": format!("Data for {} to be populated from Markdown.", key),
                "version": "1.0",
                "last_reviewed_by_user": null,
            });
            storage::write_document(&path, &placeholder)?;
            info!(path = %path.display(), "created placeholder memory file");
            created.push(key.to_string());
        }
        Ok(created)
    }

    /// Load a memory, distinguishing "absent" (`Ok(None)`) from a file that
    /// exists but cannot be read or decoded (`Err`).
    pub fn try_load(&mut self, key: &str, force_reload: bool) -> Result<Option<Value>> {
        if !force_reload {
            if let Some(value) = self.cache.get(key) {
                return Ok(Some(value.clone()));
            }
        }

        let path = self.memory_path(key);
        let value: Value = match storage::read_document(&path) {
            Ok(value) => value,
            Err(e) if e.kind().is_not_found() => return Ok(None),
            Err(e) => return Err(e.with_operation("memory::load").with_context("memory_key", key.to_string())),
        };

        debug!(memory = key, "loaded memory");
        self.cache.insert(key.to_string(), value.clone());
        Ok(Some(value))
    }

    /// Load a memory, logging and returning `None` on any failure.
    pub fn load(&mut self, key: &str) -> Option<Value> {
        self.load_with(key, false)
    }

    /// Like [`load`](Self::load) but always re-reads the file.
    pub fn reload(&mut self, key: &str) -> Option<Value> {
        self.load_with(key, true)
    }

    fn load_with(&mut self, key: &str, force_reload: bool) -> Option<Value> {
        match self.try_load(key, force_reload) {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                warn!(memory = key, path = %self.memory_path(key).display(), "memory file not found");
                None
            }
            Err(e) => {
                warn!(memory = key, error = %e, "failed to load memory");
                None
            }
        }
    }

    /// Walk `path` into the memory. An empty path returns the whole document.
    pub fn get_section(&mut self, key: &str, path: &[PathSegment]) -> Option<Value> {
        let document = self.load(key)?;
        match lookup(&document, path) {
            Some(section) => Some(section.clone()),
            None => {
                warn!(
                    memory = key,
                    section = %render_path(path, "/"),
                    "section path not found in memory"
                );
                None
            }
        }
    }

    /// Pretty-printed document for inclusion in a prompt, or a fixed
    /// placeholder if it could not be loaded or is empty.
    pub fn get_full_text(&mut self, key: &str) -> String {
        match self.load(key) {
            Some(value) if is_truthy(&value) => serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| placeholder_text(key)),
            _ => placeholder_text(key),
        }
    }

    /// Record a suggested change for the user to review. The memory file
    /// itself is never written.
    pub fn suggest_update(
        &mut self,
        key: &str,
        description: &str,
        section: Option<&[PathSegment]>,
    ) -> MemorySuggestion {
        let target_file = self
            .memory_path(key)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.json", key));

        let suggestion = MemorySuggestion {
            memory_key: key.to_string(),
            target_file,
            section: section.map(|s| s.to_vec()),
            description: description.to_string(),
            suggested_at: Local::now(),
        };

        info!(
            memory = key,
            file = %suggestion.target_file,
            section = %section.map(|s| render_path(s, " -> ")).unwrap_or_default(),
            change = description,
            "memory update suggested; apply manually after review"
        );

        if let Some(log_path) = &self.suggestion_log {
            if let Err(e) = append_suggestion(log_path, &suggestion) {
                error!(path = %log_path.display(), error = %e, "failed to record memory suggestion");
            }
        }

        self.suggestions.push(suggestion.clone());
        suggestion
    }

    /// Suggestions recorded by this process.
    pub fn suggestions(&self) -> &[MemorySuggestion] {
        &self.suggestions
    }
}

fn placeholder_text(key: &str) -> String {
    format!("[Memory content for '{}' could not be loaded or is empty]", key)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn append_suggestion(path: &Path, suggestion: &MemorySuggestion) -> Result<()> {
    let mut log: Vec<MemorySuggestion> = match storage::read_document(path) {
        Ok(entries) => entries,
        Err(e) if e.kind().is_not_found() => Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "suggestion log unreadable, starting a new one");
            Vec::new()
        }
    };
    log.push(suggestion.clone());
    storage::write_document(path, &log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, MemoryStore) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let store = MemoryStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_load_json_and_cache() {
        let (dir, mut store) = store_with(&[("x.json", r#"{"a": {"c": 1}}"#)]);

        assert_eq!(store.load("x"), Some(json!({"a": {"c": 1}})));
        std::fs::write(dir.path().join("x.json"), r#"{"a": 2}"#).unwrap();
        assert_eq!(store.load("x"), Some(json!({"a": {"c": 1}})));
        assert_eq!(store.reload("x"), Some(json!({"a": 2})));
    }

    #[test]
    fn test_load_yaml() {
        let (_dir, mut store) = store_with(&[("prefs.yaml", "tone: direct\nchannels:\n  - email\n")]);
        assert_eq!(
            store.load("prefs"),
            Some(json!({"tone": "direct", "channels": ["email"]}))
        );
    }

    #[test]
    fn test_absent_is_none_not_error() {
        let (_dir, mut store) = store_with(&[]);
        assert!(store.try_load("missing", false).unwrap().is_none());
        assert_eq!(store.load("missing"), None);
    }

    #[test]
    fn test_malformed_is_error() {
        let (_dir, mut store) = store_with(&[("broken.json", "{oops")]);
        let err = store.try_load("broken", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert_eq!(store.load("broken"), None);
    }

    #[test]
    fn test_get_section_miss_returns_none() {
        let (_dir, mut store) = store_with(&[("X.json", r#"{"a": {"c": 1}}"#)]);
        assert_eq!(store.get_section("X", &["a".into(), "b".into()]), None);
        assert_eq!(store.get_section("X", &["a".into(), "c".into()]), Some(json!(1)));
    }

    #[test]
    fn test_get_section_indices() {
        let (_dir, mut store) = store_with(&[(
            "core.json",
            r#"{"Core Values": ["Freedom", "Craft"], "version": "1.0"}"#,
        )]);

        assert_eq!(
            store.get_section("core", &["Core Values".into(), 1usize.into()]),
            Some(json!("Craft"))
        );
        assert_eq!(store.get_section("core", &["Core Values".into(), 5usize.into()]), None);
        assert_eq!(store.get_section("core", &["version".into(), 0usize.into()]), None);
        assert_eq!(store.get_section("core", &[]), store.load("core"));
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(
            PathSegment::parse_path("Core Values/0"),
            vec![PathSegment::Key("Core Values".into()), PathSegment::Index(0)]
        );
        assert!(PathSegment::parse_path("").is_empty());
    }

    #[test]
    fn test_full_text_is_pretty_and_deterministic() {
        let (_dir, mut store) = store_with(&[("g.json", r#"{"b": 1, "a": [true]}"#)]);
        let text = store.get_full_text("g");
        assert_eq!(text, "{\n  \"a\": [\n    true\n  ],\n  \"b\": 1\n}");
        assert_eq!(text, store.get_full_text("g"));
    }

    #[test]
    fn test_full_text_placeholder() {
        let (_dir, mut store) = store_with(&[("empty.json", "{}")]);
        assert_eq!(
            store.get_full_text("empty"),
            "[Memory content for 'empty' could not be loaded or is empty]"
        );
        assert_eq!(
            store.get_full_text("nothing"),
            "[Memory content for 'nothing' could not be loaded or is empty]"
        );
    }

    #[test]
    fn test_ensure_core_memories_only_creates_missing() {
        let (dir, store) = store_with(&[("tan_growth_plan_goals.yaml", "goals: []\n")]);

        let created = store.ensure_core_memories().unwrap();
        assert_eq!(created, vec![CORE_IDENTITY_KEY, COGNITIVE_PREFERENCES_KEY]);
        assert!(dir.path().join("tan_core_identity_values.json").exists());
        assert!(!dir.path().join("tan_growth_plan_goals.json").exists());
        assert!(store.ensure_core_memories().unwrap().is_empty());
    }

    #[test]
    fn test_suggest_update_never_touches_memory_file() {
        let (dir, store) = store_with(&[("prefs.json", r#"{"style": "terse"}"#)]);
        let log = dir.path().join("suggestions.json");
        let mut store = store.with_suggestion_log(&log);

        let section = PathSegment::parse_path("Communication");
        store.suggest_update("prefs", "Add preferred channels", Some(&section));
        store.suggest_update("prefs", "Mention async-first", None);

        let on_disk = std::fs::read_to_string(dir.path().join("prefs.json")).unwrap();
        assert_eq!(on_disk, r#"{"style": "terse"}"#);
        assert_eq!(store.suggestions().len(), 2);
        assert_eq!(store.suggestions()[0].target_file, "prefs.json");

        let logged: Vec<MemorySuggestion> = storage::read_document(&log).unwrap();
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[1].description, "Mention async-first");
    }
}
