//! # Prompt Store
//!
//! Read-only access to the prompt templates under `<prompts_dir>/<module>/<file>`.
//! Templates are authored by hand outside TanOS; this store only reads them.
//!
//! Successful loads are cached by `module/filename`. A failed load is not
//! cached, so the next call goes back to disk.

use crate::error::{self, Result};
use crate::module::TOOLS_MODULE;
use crate::storage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct PromptStore {
    prompts_dir: PathBuf,
    cache: HashMap<String, String>,
}

impl PromptStore {
    pub fn new(prompts_dir: impl AsRef<Path>) -> Self {
        Self {
            prompts_dir: prompts_dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    fn cache_key(module: &str, filename: &str) -> String {
        format!("{}/{}", module, filename)
    }

    pub fn prompt_path(&self, module: &str, filename: &str) -> PathBuf {
        self.prompts_dir.join(module).join(filename)
    }

    /// Load a template, serving it from cache when possible.
    pub fn load(&mut self, module: &str, filename: &str) -> Result<String> {
        if let Some(content) = self.cache.get(&Self::cache_key(module, filename)) {
            return Ok(content.clone());
        }
        self.reload(module, filename)
    }

    /// Load a template from disk, replacing any cached copy.
    pub fn reload(&mut self, module: &str, filename: &str) -> Result<String> {
        let key = Self::cache_key(module, filename);
        let path = self.prompt_path(module, filename);

        let content = storage::read_text(&path).map_err(|e| {
            if e.kind().is_not_found() {
                warn!(path = %path.display(), "prompt file not found");
                error::prompt_not_found(module, filename)
            } else {
                warn!(path = %path.display(), error = %e, "failed to read prompt");
                e.with_operation("prompt::load")
                    .with_context("module", module)
                    .with_context("filename", filename)
            }
        })?;

        debug!(prompt = %key, "loaded prompt");
        self.cache.insert(key, content.clone());
        Ok(content)
    }

    /// Load a conceptual tool prompt from `Workshop/Tools/<filename>`.
    pub fn load_tool(&mut self, filename: &str) -> Result<String> {
        self.load(TOOLS_MODULE.as_str(), &format!("Tools/{}", filename))
    }

    pub fn is_cached(&self, module: &str, filename: &str) -> bool {
        self.cache.contains_key(&Self::cache_key(module, filename))
    }
}
