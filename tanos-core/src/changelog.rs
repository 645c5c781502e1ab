//! Nomad changelog: an ordered list of version entries, newest first.
//!
//! Versions are caller-supplied strings. Duplicates and out-of-order
//! versions are accepted as given.

use crate::state::DEFAULT_NOMAD_VERSION;
use crate::storage;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const FALLBACK_VERSION_SUFFIX: &str = "-next";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub date: String,
    pub summary: String,
    #[serde(default)]
    pub impacted_modules: Vec<String>,
    #[serde(default, alias = "files_updated_by_tan")]
    pub files_updated: Vec<String>,
    pub timestamp: DateTime<Local>,
}

pub struct ChangelogStore {
    path: PathBuf,
    entries: Vec<ChangelogEntry>,
}

impl ChangelogStore {
    /// Load the changelog, starting empty when the file is missing or bad.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match storage::read_document::<Vec<ChangelogEntry>>(&path) {
            Ok(entries) => {
                debug!(path = %path.display(), count = entries.len(), "loaded changelog");
                entries
            }
            Err(e) if e.kind().is_not_found() => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load changelog, starting empty");
                Vec::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new entry at the front and persist the whole list.
    ///
    /// A failed write is logged and the entry stays in memory.
    pub fn add_entry(
        &mut self,
        version: &str,
        date: &str,
        summary: &str,
        impacted_modules: &[String],
        files_updated: &[String],
    ) -> &ChangelogEntry {
        self.entries.insert(
            0,
            ChangelogEntry {
                version: version.to_string(),
                date: date.to_string(),
                summary: summary.to_string(),
                impacted_modules: impacted_modules.to_vec(),
                files_updated: files_updated.to_vec(),
                timestamp: Local::now(),
            },
        );
        info!(version, "changelog entry added");

        if let Err(e) = storage::write_document(&self.path, &self.entries) {
            let e = e.with_operation("changelog::add_entry");
            error!(path = %self.path.display(), error = %e, "failed to save changelog");
        }
        &self.entries[0]
    }

    pub fn latest_version(&self) -> &str {
        self.entries
            .first()
            .map(|e| e.version.as_str())
            .unwrap_or(DEFAULT_NOMAD_VERSION)
    }

    /// The newest `limit` entries.
    pub fn entries(&self, limit: usize) -> &[ChangelogEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draft a one-line entry for the version after `current_version`,
    /// dated today. Nothing is written.
    pub fn draft_entry_text(
        current_version: &str,
        summary: &str,
        impacted_modules: &[String],
        files_updated: &[String],
    ) -> String {
        format_draft(
            current_version,
            summary,
            impacted_modules,
            files_updated,
            Local::now().date_naive(),
        )
    }
}

/// Bump the patch component of a `major.minor.patch` version. Anything
/// else gets a fixed suffix appended instead.
pub fn next_version(current: &str) -> String {
    let parts: Vec<&str> = current.split('.').collect();
    if parts.len() == 3 {
        if let (Ok(major), Ok(minor), Ok(patch)) = (
            parts[0].parse::<u64>(),
            parts[1].parse::<u64>(),
            parts[2].parse::<u64>(),
        ) {
            return format!("{}.{}.{}", major, minor, patch + 1);
        }
    }
    warn!(version = current, "version is not major.minor.patch, appending suffix");
    format!("{}{}", current, FALLBACK_VERSION_SUFFIX)
}

pub fn format_draft(
    current_version: &str,
    summary: &str,
    impacted_modules: &[String],
    files_updated: &[String],
    date: NaiveDate,
) -> String {
    let modules = if impacted_modules.is_empty() {
        "N/A".to_string()
    } else {
        impacted_modules.join(", ")
    };
    let files = if files_updated.is_empty() {
        "relevant prompts/memories".to_string()
    } else {
        files_updated.join(", ")
    };
    format!(
        "**Version {} ({}):** Learned/Refined: {}. Impacted Modules: {}. Action: Updated {}.",
        next_version(current_version),
        date.format("%Y-%m-%d"),
        summary,
        modules,
        files
    )
}
