//! # Operational State ("Captain's Log")
//!
//! One mutable JSON document describing the current session: location,
//! mood and energy, health flags, active projects, recent insights, pending
//! decisions and the Nomad version.
//!
//! ## Rules
//! - `current_date_time` is derived. It is recomputed on every read and
//!   save and can never be set by a caller.
//! - Every mutator saves immediately. Saves rewrite the whole document.
//! - A failed save is logged and swallowed; [`OperationalStateStore::try_save`]
//!   exposes the error for callers that care.
//! - Single writer: nothing guards against two processes sharing the file.

use crate::error::{self, Result};
use crate::storage;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const DEFAULT_LOCATION: &str = "Barcelona, Catalonia, Spain";
pub const DEFAULT_NOMAD_VERSION: &str = "0.3";
pub const MAX_RECENT_INSIGHTS: usize = 5;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub status: String,
    pub milestone: String,
    pub next_step: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDecision {
    pub transformative_flag: bool,
}

/// The operational state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalState {
    /// Derived; whatever is on disk is ignored.
    #[serde(default)]
    pub current_date_time: String,
    #[serde(default = "default_location", alias = "tan_current_location")]
    pub location: String,
    #[serde(default = "default_mood", alias = "tan_mood_energy_summary")]
    pub mood_energy_summary: String,
    #[serde(default = "default_flags")]
    pub health_metric_flags: String,
    #[serde(default)]
    pub active_projects: BTreeMap<String, Project>,
    /// Newest first, at most [`MAX_RECENT_INSIGHTS`].
    #[serde(default)]
    pub recent_key_insights: Vec<Insight>,
    #[serde(default)]
    pub pending_decisions: BTreeMap<String, PendingDecision>,
    #[serde(default = "default_version")]
    pub nomad_version: String,
    /// Keys set through [`OperationalStateStore::set`] that have no field.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_mood() -> String {
    "Neutral, Energy 5/10 (Initial State)".to_string()
}

fn default_flags() -> String {
    "No flags active (Initial State)".to_string()
}

fn default_version() -> String {
    DEFAULT_NOMAD_VERSION.to_string()
}

impl Default for OperationalState {
    fn default() -> Self {
        Self {
            current_date_time: current_date_time(),
            location: default_location(),
            mood_energy_summary: default_mood(),
            health_metric_flags: default_flags(),
            active_projects: BTreeMap::new(),
            recent_key_insights: Vec::new(),
            pending_decisions: BTreeMap::new(),
            nomad_version: default_version(),
            extra: BTreeMap::new(),
        }
    }
}

impl OperationalState {
    fn refresh(&mut self) {
        self.current_date_time = current_date_time();
    }

    /// Render the state for inclusion in an LLM context. Empty sections
    /// print an explicit "none" line so the shape is always the same.
    pub fn format(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Operational State Snapshot (as of {}):", self.current_date_time);
        let _ = writeln!(out, "- Location: {}", self.location);
        let _ = writeln!(out, "- Reported Mood/Energy: {}", self.mood_energy_summary);
        let _ = writeln!(out, "- Health Metric Flags: {}", self.health_metric_flags);
        let _ = writeln!(out, "- Nomad Conceptual Version: {}", self.nomad_version);

        out.push_str("\nActive Projects & Focus:\n");
        if self.active_projects.is_empty() {
            out.push_str("- No active projects listed.\n");
        }
        for (name, project) in &self.active_projects {
            let _ = writeln!(out, "  - Project: {}", name);
            let _ = writeln!(out, "    Status: {}", project.status);
            let _ = writeln!(out, "    Current Milestone: {}", project.milestone);
            let _ = writeln!(out, "    Next Concrete Step: {}", project.next_step);
        }

        out.push_str("\nRecent Key Insights/Reflections:\n");
        if self.recent_key_insights.is_empty() {
            out.push_str("- No recent insights logged.\n");
        }
        for insight in &self.recent_key_insights {
            let _ = writeln!(out, "  - ({}) {}", insight.date, insight.summary);
        }

        out.push_str("\nPending Decisions:\n");
        if self.pending_decisions.is_empty() {
            out.push_str("- No pending decisions listed.\n");
        }
        for (name, decision) in &self.pending_decisions {
            let flag = if decision.transformative_flag { "YES" } else { "NO" };
            let _ = writeln!(out, "  - Decision: {} (Transformative: {})", name, flag);
        }

        out.trim().to_string()
    }
}

fn current_date_time() -> String {
    Local::now().format(DATE_TIME_FORMAT).to_string()
}

fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Owns the state document and its file.
pub struct OperationalStateStore {
    path: PathBuf,
    state: OperationalState,
    writes: usize,
}

impl OperationalStateStore {
    /// Load the state from `path`, or start from defaults when the file is
    /// missing or unreadable. Opening never writes.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut state = match storage::read_document::<OperationalState>(&path) {
            Ok(state) => {
                debug!(path = %path.display(), "loaded operational state");
                state
            }
            Err(e) if e.kind().is_not_found() => {
                info!(path = %path.display(), "initializing new operational state");
                OperationalState::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load operational state, initializing new state");
                OperationalState::default()
            }
        };
        state.refresh();

        Self {
            path,
            state,
            writes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of successful writes made by this store.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// A copy of the state with a fresh `current_date_time`.
    pub fn snapshot(&mut self) -> OperationalState {
        self.state.refresh();
        self.state.clone()
    }

    pub fn get_formatted(&mut self) -> String {
        self.state.refresh();
        self.state.format()
    }

    /// Persist the full document.
    pub fn try_save(&mut self) -> Result<()> {
        self.state.refresh();
        storage::write_document(&self.path, &self.state)
            .map_err(|e| e.with_operation("state::save"))?;
        self.writes += 1;
        debug!(path = %self.path.display(), "operational state saved");
        Ok(())
    }

    /// Persist the full document; failures are logged, not returned.
    pub fn save(&mut self) {
        if let Err(e) = self.try_save() {
            error!(path = %self.path.display(), error = %e, "failed to save operational state");
        }
    }

    /// Set one field by its document key. `current_date_time` is refused
    /// with a warning. Unknown keys are kept alongside the known fields.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        fn text(key: &str, value: Value) -> Result<String> {
            match value {
                Value::String(s) => Ok(s),
                other => Err(error::invalid_argument(format!(
                    "state field '{}' expects a string, got {}",
                    key, other
                ))),
            }
        }
        fn typed<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T> {
            serde_json::from_value(value).map_err(|e| {
                error::invalid_argument(format!("state field '{}' has the wrong shape: {}", key, e))
            })
        }

        match key {
            "current_date_time" => {
                warn!("current_date_time is derived; manual update ignored");
                return Ok(());
            }
            "location" | "tan_current_location" => self.state.location = text(key, value)?,
            "mood_energy_summary" | "tan_mood_energy_summary" => {
                self.state.mood_energy_summary = text(key, value)?
            }
            "health_metric_flags" => self.state.health_metric_flags = text(key, value)?,
            "nomad_version" => self.state.nomad_version = text(key, value)?,
            "active_projects" => self.state.active_projects = typed(key, value)?,
            "recent_key_insights" => {
                let mut insights: Vec<Insight> = typed(key, value)?;
                insights.truncate(MAX_RECENT_INSIGHTS);
                self.state.recent_key_insights = insights;
            }
            "pending_decisions" => self.state.pending_decisions = typed(key, value)?,
            _ => {
                self.state.extra.insert(key.to_string(), value);
            }
        }

        info!(key, "operational state updated");
        self.save();
        Ok(())
    }

    /// Insert or replace a project by name.
    pub fn upsert_project(&mut self, name: &str, status: &str, milestone: &str, next_step: &str) {
        self.state.active_projects.insert(
            name.to_string(),
            Project {
                status: status.to_string(),
                milestone: milestone.to_string(),
                next_step: next_step.to_string(),
            },
        );
        info!(project = name, "project added/updated");
        self.save();
    }

    /// Put an insight at the front, dropping the oldest past the cap.
    pub fn push_insight(&mut self, summary: &str) {
        self.state.recent_key_insights.insert(
            0,
            Insight {
                summary: summary.to_string(),
                date: today(),
            },
        );
        self.state.recent_key_insights.truncate(MAX_RECENT_INSIGHTS);
        info!(insight = summary, "insight added");
        self.save();
    }

    /// Insert or replace a pending decision.
    pub fn upsert_decision(&mut self, name: &str, transformative: bool) {
        self.state.pending_decisions.insert(
            name.to_string(),
            PendingDecision {
                transformative_flag: transformative,
            },
        );
        self.save();
    }

    /// Update mood/energy and health flags together with one save.
    pub fn record_health(&mut self, mood_energy: Option<String>, flags: Option<String>) {
        if let Some(mood_energy) = mood_energy {
            self.state.mood_energy_summary = mood_energy;
        }
        if let Some(flags) = flags {
            self.state.health_metric_flags = flags;
        }
        self.save();
    }

    /// Set the version and save.
    pub fn set_version(&mut self, version: &str) {
        self.sync_version(version);
        info!(version, "nomad version updated");
        self.save();
    }

    /// Set the version in memory only; the next save persists it.
    pub fn sync_version(&mut self, version: &str) {
        self.state.nomad_version = version.to_string();
    }

    pub fn version(&self) -> &str {
        &self.state.nomad_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, OperationalStateStore) {
        let dir = TempDir::new().unwrap();
        let store = OperationalStateStore::open(dir.path().join("state.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_gives_defaults_without_writing() {
        let (dir, mut store) = store();
        let state = store.snapshot();
        assert_eq!(state.location, DEFAULT_LOCATION);
        assert_eq!(state.nomad_version, "0.3");
        assert!(!state.current_date_time.is_empty());
        assert!(!dir.path().join("state.json").exists());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let mut store = OperationalStateStore::open(&path);
        assert_eq!(store.snapshot().mood_energy_summary, default_mood());
    }

    #[test]
    fn test_mutations_round_trip() {
        let (_dir, mut store) = store();
        store.set("location", json!("Lisbon")).unwrap();
        store.set("mood_energy_summary", json!("Focused, Energy 7/10")).unwrap();
        store.set("tan_timezone", json!("Europe/Lisbon")).unwrap();
        store.upsert_project("TanOS", "In Progress", "Core", "Write MemoryStore");
        store.push_insight("Structured memories matter");
        store.upsert_decision("Move to Lisbon", true);
        store.set_version("0.3.1");
        let before = store.snapshot();

        let mut reopened = OperationalStateStore::open(store.path());
        let after = reopened.snapshot();

        assert_eq!(after.extra.get("tan_timezone"), Some(&json!("Europe/Lisbon")));
        assert_eq!(
            OperationalState { current_date_time: String::new(), ..before },
            OperationalState { current_date_time: String::new(), ..after }
        );
    }

    #[test]
    fn test_insights_capped_newest_first() {
        let (_dir, mut store) = store();
        for i in 1..=6 {
            store.push_insight(&format!("I{}", i));
        }
        let summaries: Vec<_> = store
            .snapshot()
            .recent_key_insights
            .into_iter()
            .map(|i| i.summary)
            .collect();
        assert_eq!(summaries, vec!["I6", "I5", "I4", "I3", "I2"]);
    }

    #[test]
    fn test_upsert_project_overwrites() {
        let (_dir, mut store) = store();
        store.upsert_project("Blog", "Planned", "Outline", "Pick topic");
        store.upsert_project("Blog", "Active", "Draft", "Write intro");
        let state = store.snapshot();
        assert_eq!(state.active_projects.len(), 1);
        assert_eq!(state.active_projects["Blog"].status, "Active");
    }

    #[test]
    fn test_current_date_time_cannot_be_set() {
        let (_dir, mut store) = store();
        store.set("current_date_time", json!("1999-01-01")).unwrap();
        assert_ne!(store.snapshot().current_date_time, "1999-01-01");
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let (_dir, mut store) = store();
        let err = store.set("location", json!(42)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_each_mutator_saves() {
        let (_dir, mut store) = store();
        store.set("health_metric_flags", json!("HRV Yellow")).unwrap();
        store.upsert_project("A", "s", "m", "n");
        store.push_insight("x");
        store.set_version("0.4");
        assert_eq!(store.writes(), 4);

        store.sync_version("0.5");
        assert_eq!(store.writes(), 4);
    }

    #[test]
    fn test_legacy_field_names_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"current_date_time": "old", "tan_current_location": "Madrid",
                "tan_mood_energy_summary": "Calm", "nomad_version": "0.3.2"}"#,
        )
        .unwrap();

        let mut store = OperationalStateStore::open(&path);
        let state = store.snapshot();
        assert_eq!(state.location, "Madrid");
        assert_eq!(state.mood_energy_summary, "Calm");
        assert_eq!(state.nomad_version, "0.3.2");
        assert_ne!(state.current_date_time, "old");
        assert!(state.extra.is_empty());
    }

    #[test]
    fn test_formatted_empty_sections() {
        let (_dir, mut store) = store();
        let text = store.get_formatted();
        assert!(text.starts_with("Operational State Snapshot (as of "));
        assert!(text.contains("- No active projects listed."));
        assert!(text.contains("- No recent insights logged."));
        assert!(text.ends_with("- No pending decisions listed."));
    }

    #[test]
    fn test_formatted_sections() {
        let (_dir, mut store) = store();
        store.upsert_project("TanOS", "In Progress", "Core", "Tests");
        store.upsert_decision("Sabbatical", false);
        let text = store.get_formatted();
        assert!(text.contains("  - Project: TanOS\n    Status: In Progress\n    Current Milestone: Core\n    Next Concrete Step: Tests"));
        assert!(text.contains("  - Decision: Sabbatical (Transformative: NO)"));
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the write fail.
        let path = dir.path().join("state.json");
        std::fs::create_dir(&path).unwrap();
        let mut store = OperationalStateStore::open(&path);

        store.push_insight("still works");
        assert_eq!(store.writes(), 0);
        assert!(store.try_save().is_err());
        assert_eq!(store.snapshot().recent_key_insights.len(), 1);
    }
}
