//! Orchestrator - routes user input through a module prompt to the LLM

use crate::architect::{EvolutionBundle, EvolutionCycle};
use crate::health::HealthLog;
use chrono::Local;
use tanos_core::error;
use tanos_core::{
    ChangelogEntry, ChangelogStore, Error, ErrorKind, LlmProvider, MemoryStore, Module,
    OperationalStateStore, PromptStore, Result, Settings, COGNITIVE_PREFERENCES_KEY,
    CORE_IDENTITY_KEY, GROWTH_GOALS_KEY,
};
use tracing::{debug, info, warn};

/// Owns every store plus the provider for one TanOS process.
pub struct Orchestrator<P> {
    prompts: PromptStore,
    memories: MemoryStore,
    state: OperationalStateStore,
    changelog: ChangelogStore,
    provider: P,
}

impl<P: LlmProvider> Orchestrator<P> {
    pub fn new(
        prompts: PromptStore,
        memories: MemoryStore,
        state: OperationalStateStore,
        changelog: ChangelogStore,
        provider: P,
    ) -> Self {
        Self {
            prompts,
            memories,
            state,
            changelog,
            provider,
        }
    }

    /// Create the data layout, seed missing core memories and open every
    /// store at the paths `settings` points to.
    pub fn from_settings(settings: &Settings, provider: P) -> Result<Self> {
        settings.ensure_layout()?;
        let memories = MemoryStore::new(settings.memories_dir())
            .with_suggestion_log(settings.suggestions_file());
        let created = memories.ensure_core_memories()?;
        if !created.is_empty() {
            info!(?created, "created placeholder memories");
        }

        info!(provider = provider.name(), "TanOS orchestrator initialized");
        Ok(Self::new(
            PromptStore::new(&settings.prompts_dir),
            memories,
            OperationalStateStore::open(settings.state_file()),
            ChangelogStore::open(settings.changelog_file()),
            provider,
        ))
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn prompts_mut(&mut self) -> &mut PromptStore {
        &mut self.prompts
    }

    pub fn memories_mut(&mut self) -> &mut MemoryStore {
        &mut self.memories
    }

    pub fn state(&self) -> &OperationalStateStore {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut OperationalStateStore {
        &mut self.state
    }

    pub fn changelog(&self) -> &ChangelogStore {
        &self.changelog
    }

    /// Compile the context every interaction sends: the operational state
    /// followed by the three core memories.
    ///
    /// Refreshes `nomad_version` from the changelog first. The refresh is
    /// in memory only; the caller's save persists it.
    pub fn full_context(&mut self) -> String {
        let latest = self.changelog.latest_version().to_string();
        self.state.sync_version(&latest);

        let state = self.state.get_formatted();
        let mut memories = String::new();
        for (i, (title, key)) in [
            ("Core Identity & Values Summary", CORE_IDENTITY_KEY),
            ("Growth Plan & Goals Summary", GROWTH_GOALS_KEY),
            ("Cognitive & OS Preferences Summary", COGNITIVE_PREFERENCES_KEY),
        ]
        .into_iter()
        .enumerate()
        {
            if i > 0 {
                memories.push_str("\n\n");
            }
            let path = self.memories.memory_path(key);
            memories.push_str(&format!(
                "**{} (from {})**\n{}",
                title,
                path.display(),
                self.memories.get_full_text(key)
            ));
        }

        format!(
            "--- CURRENT CAPTAIN'S LOG OPERATIONAL STATE ---\n\
             {}\n\
             --- END CAPTAIN'S LOG ---\n\n\
             --- RELEVANT MEMORIES (Tan's Core Profile) ---\n\
             {}\n\
             --- END MEMORIES ---\n",
            state, memories
        )
    }

    /// One interaction: module prompt + full context + user input to the
    /// provider, then a single state save.
    ///
    /// Fails without touching state when the module key is unknown or its
    /// prompt cannot be loaded.
    pub async fn try_process_interaction(
        &mut self,
        user_input: &str,
        module_key: &str,
    ) -> Result<String> {
        let module: Module = module_key.parse()?;
        info!(%module, "processing interaction");

        let system_prompt = self.prompts.load(module.as_str(), module.prompt_file())?;
        let context = self.full_context();

        let response = self
            .provider
            .send_prompt(&system_prompt, user_input, Some(&context))
            .await;
        debug!(%module, chars = response.len(), "response received");

        info!(%module, note = module.post_interaction_note(), "post-interaction");
        self.state.save();

        Ok(response)
    }

    /// [`Self::try_process_interaction`] with failures rendered as
    /// `[Orchestrator Error: ...]` markers.
    pub async fn process_interaction(&mut self, user_input: &str, module_key: &str) -> String {
        match self.try_process_interaction(user_input, module_key).await {
            Ok(response) => response,
            Err(e) => {
                warn!(module = module_key, error = %e, "interaction failed");
                error_marker(&e, module_key)
            }
        }
    }

    /// Start a guided conceptual tool from `Workshop/Tools/<tool_file>`.
    pub async fn run_conceptual_tool(&mut self, tool_file: &str, user_input: &str) -> String {
        let system_prompt = match self.prompts.load_tool(tool_file) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(tool = tool_file, error = %e, "conceptual tool unavailable");
                return format!(
                    "[Orchestrator Error: Could not load conceptual tool prompt: {}]",
                    tool_file
                );
            }
        };
        let context = self.full_context();
        let user_prompt = format!(
            "(Now guiding Tan through the '{}' process. Initial context/question from Tan: '{}')\n\
             Let's begin with the first step of this conceptual tool.",
            tool_file, user_input
        );

        info!(tool = tool_file, "conceptual tool started");
        self.provider
            .send_prompt(&system_prompt, &user_prompt, Some(&context))
            .await
    }

    /// Record a health check-in in the operational state, then hand it to
    /// CrowsNest as text.
    pub async fn log_health(&mut self, log: &HealthLog) -> Result<String> {
        if log.is_empty() {
            return Err(error::invalid_argument("No health data provided to log.")
                .with_operation("orchestrator::log_health"));
        }

        let text = log.render();
        info!(metrics = %text, "logging health metrics");
        self.state
            .record_health(log.mood_energy_summary(), Some(log.flags()));

        Ok(self
            .process_interaction(&text, Module::CrowsNest.as_str())
            .await)
    }

    /// Draft the next changelog line from the latest version. Nothing is
    /// written.
    pub fn draft_changelog_entry(
        &self,
        summary: &str,
        impacted_modules: &[String],
        files_updated: &[String],
    ) -> String {
        ChangelogStore::draft_entry_text(
            self.changelog.latest_version(),
            summary,
            impacted_modules,
            files_updated,
        )
    }

    /// Commit a changelog entry dated today and move the operational state
    /// to its version. Write failures in either store are logged only.
    pub fn commit_changelog_entry(
        &mut self,
        version: &str,
        summary: &str,
        impacted_modules: &[String],
        files_updated: &[String],
    ) -> ChangelogEntry {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let entry = self
            .changelog
            .add_entry(version, &date, summary, impacted_modules, files_updated)
            .clone();
        self.state.set_version(version);
        entry
    }

    /// An ArchitectOS cycle over this orchestrator's stores.
    pub fn architect(&mut self) -> EvolutionCycle<'_, P> {
        EvolutionCycle::new(&mut self.prompts, &mut self.memories, &self.provider)
    }

    /// Run one ArchitectOS cycle against `module/filename`. A target prompt
    /// that cannot be loaded comes back as `[ArchitectOS Error: ...]` text.
    pub async fn evolve_prompt(
        &mut self,
        objective: &str,
        module: &str,
        filename: &str,
    ) -> std::result::Result<EvolutionBundle, String> {
        self.architect()
            .run(objective, module, filename)
            .await
            .map_err(|e| {
                warn!(module, filename, error = %e, "no evolved suggestions generated");
                format!(
                    "[ArchitectOS Error: Could not load target prompt {}/{}]",
                    module, filename
                )
            })
    }
}

/// The text shown to the user in place of a response.
pub fn error_marker(err: &Error, module_key: &str) -> String {
    match err.kind() {
        ErrorKind::UnknownModule => {
            format!("[Orchestrator Error: Unknown module key '{}']", module_key)
        }
        _ => match (err.context_value("module"), err.context_value("filename")) {
            (Some(module), Some(filename)) => format!(
                "[Orchestrator Error: Could not load prompt for {}/{}]",
                module, filename
            ),
            _ => format!("[Orchestrator Error: {}]", err.message()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanos_core::MockProvider;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let settings = Settings::default()
                .with_prompts_dir(dir.path().join("prompts"))
                .with_data_dir(dir.path().join("data"));
            for module in Module::ALL {
                let path = settings.prompts_dir.join(module.as_str()).join(module.prompt_file());
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, format!("// TanOS - {} Module", module)).unwrap();
            }
            Self { dir, settings }
        }

        fn orchestrator(&self) -> Orchestrator<MockProvider> {
            Orchestrator::from_settings(&self.settings, MockProvider::new()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_from_settings_seeds_layout() {
        let fx = Fixture::new();
        let _orch = fx.orchestrator();
        assert!(fx.settings.memories_dir().join("tan_core_identity_values.json").exists());
        assert!(fx.settings.changelogs_dir().is_dir());
        assert!(!fx.settings.state_file().exists());
        assert!(fx.dir.path().join("data").is_dir());
    }

    #[tokio::test]
    async fn test_crowsnest_saves_once_with_changelog_version() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.commit_changelog_entry("0.3.4", "Tuned CrowsNest", &[], &[]);
        assert_eq!(orch.state().writes(), 1);

        let response = orch.process_interaction("HRV 52, Energy 6", "CrowsNest").await;
        assert!(response.contains("HRV 52, Energy 6"));
        assert_eq!(orch.state().writes(), 2);

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(fx.settings.state_file()).unwrap())
                .unwrap();
        assert_eq!(saved["nomad_version"], "0.3.4");
    }

    #[tokio::test]
    async fn test_interaction_saves_exactly_once() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();

        orch.process_interaction("Sleep 7/10", "CrowsNest").await;
        assert_eq!(orch.state().writes(), 1);
        assert_eq!(orch.provider().call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_module_returns_marker_without_writing() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.state_mut().push_insight("baseline");
        let state_file = fx.settings.state_file();
        let before = std::fs::metadata(&state_file).unwrap().modified().unwrap();

        let response = orch.process_interaction("hi", "UnknownModule").await;

        assert_eq!(response, "[Orchestrator Error: Unknown module key 'UnknownModule']");
        assert_eq!(orch.state().writes(), 1);
        assert_eq!(orch.provider().call_count(), 0);
        let after = std::fs::metadata(&state_file).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_missing_prompt_returns_marker() {
        let fx = Fixture::new();
        std::fs::remove_file(
            fx.settings
                .prompts_dir
                .join("Workshop/Execution_Module_Prompt.txt"),
        )
        .unwrap();
        let mut orch = fx.orchestrator();

        let response = orch.process_interaction("build it", "Workshop").await;
        assert_eq!(
            response,
            "[Orchestrator Error: Could not load prompt for Workshop/Execution_Module_Prompt.txt]"
        );
        assert_eq!(orch.state().writes(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_prompt_and_full_context() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.state_mut().upsert_project("TanOS", "Active", "Core", "Tests");

        orch.process_interaction("Plan my week", "chartroom").await;

        let requests = orch.provider().requests();
        let request = &requests[0];
        assert_eq!(request.system_prompt(), Some("// TanOS - ChartRoom Module"));
        assert_eq!(request.user_prompt(), Some("Plan my week"));

        let context = request.context().unwrap();
        assert!(context.starts_with("--- CURRENT CAPTAIN'S LOG OPERATIONAL STATE ---\n"));
        assert!(context.contains("  - Project: TanOS"));
        assert!(context.contains("**Core Identity & Values Summary"));
        assert!(context.contains("**Growth Plan & Goals Summary"));
        assert!(context.contains("**Cognitive & OS Preferences Summary"));
        assert!(context.contains("placeholder_data"));
        assert!(context.ends_with("--- END MEMORIES ---\n"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_returned_as_text() {
        let fx = Fixture::new();
        let mut orch = Orchestrator::from_settings(&fx.settings, MockProvider::failing("offline")).unwrap();

        let response = orch.process_interaction("hi", "CaptainsLog").await;
        assert!(response.starts_with("[Error:"));
        assert_eq!(orch.state().writes(), 1);
    }

    #[tokio::test]
    async fn test_log_health_updates_state_and_asks_crowsnest() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        let log = HealthLog {
            sleep_quality: Some(5.0),
            hrv: Some(52),
            mood: Some("Neutral".into()),
            energy: Some(6),
            ..Default::default()
        };

        let response = orch.log_health(&log).await.unwrap();
        assert!(response.contains("Sleep Quality: 5; Hrv: 52; Mood: Neutral; Energy: 6"));

        let state = orch.state_mut().snapshot();
        assert_eq!(state.health_metric_flags, "Sleep Yellow");
        assert_eq!(state.mood_energy_summary, "Neutral, Energy 6/10");

        let requests = orch.provider().requests();
        let request = &requests[0];
        assert_eq!(request.system_prompt(), Some("// TanOS - CrowsNest Module"));
        assert!(request.context().unwrap().contains("Health Metric Flags: Sleep Yellow"));
    }

    #[tokio::test]
    async fn test_log_health_rejects_empty_log() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        let err = orch.log_health(&HealthLog::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(orch.provider().call_count(), 0);
    }

    #[tokio::test]
    async fn test_conceptual_tool() {
        let fx = Fixture::new();
        let tool = fx
            .settings
            .prompts_dir
            .join("Workshop/Tools/apply_systems_thinking_lens_prompt.txt");
        std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
        std::fs::write(&tool, "Systems thinking tool").unwrap();
        let mut orch = fx.orchestrator();

        let response = orch
            .run_conceptual_tool("apply_systems_thinking_lens_prompt.txt", "Find bottlenecks")
            .await;
        assert!(response.contains("Now guiding Tan through the 'apply_systems_thinking_lens_prompt.txt' process"));
        assert_eq!(orch.provider().requests()[0].system_prompt(), Some("Systems thinking tool"));

        let missing = orch.run_conceptual_tool("nope.txt", "x").await;
        assert_eq!(
            missing,
            "[Orchestrator Error: Could not load conceptual tool prompt: nope.txt]"
        );
    }

    #[tokio::test]
    async fn test_commit_changelog_entry_propagates_version() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();

        let draft = orch.draft_changelog_entry("Refined planning", &["ChartRoom".to_string()], &[]);
        assert!(draft.starts_with("**Version 0.3-next ("));

        let entry = orch
            .commit_changelog_entry(
                "0.3.1",
                "Refined planning",
                &["ChartRoom".to_string()],
                &["ChartRoom/Planning_Module_Prompt.txt".to_string()],
            );
        assert_eq!(entry.version, "0.3.1");
        assert_eq!(orch.changelog().latest_version(), "0.3.1");
        assert_eq!(orch.state().version(), "0.3.1");

        let draft = orch.draft_changelog_entry("Next", &[], &[]);
        assert!(draft.starts_with("**Version 0.3.2 ("));
    }

    #[tokio::test]
    async fn test_commit_survives_changelog_write_failure() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        std::fs::create_dir_all(fx.settings.changelog_file()).unwrap();

        let entry = orch.commit_changelog_entry("0.4", "Unwritable changelog", &[], &[]);
        assert_eq!(entry.version, "0.4");
        assert_eq!(orch.changelog().latest_version(), "0.4");
        assert_eq!(orch.state().version(), "0.4");
        assert_eq!(orch.state().writes(), 1);

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(fx.settings.state_file()).unwrap())
                .unwrap();
        assert_eq!(saved["nomad_version"], "0.4");
    }

    #[tokio::test]
    async fn test_evolve_prompt_missing_target_is_marker() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();

        let marker = orch
            .evolve_prompt("anything", "Workshop", "Missing_Prompt.txt")
            .await
            .unwrap_err();
        assert_eq!(
            marker,
            "[ArchitectOS Error: Could not load target prompt Workshop/Missing_Prompt.txt]"
        );
        assert_eq!(orch.provider().call_count(), 0);
        assert_eq!(orch.state().writes(), 0);

        let bundle = orch
            .evolve_prompt("Clearer steps", "Workshop", "Execution_Module_Prompt.txt")
            .await
            .unwrap();
        assert_eq!(bundle.next_steps, crate::NEXT_STEPS);
        assert_eq!(orch.provider().call_count(), 3);
    }

    #[tokio::test]
    async fn test_architect_uses_orchestrator_stores() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();

        let bundle = orch
            .architect()
            .run("Sharper check-ins", "CrowsNest", "Sensory_Input_Module_Prompt.txt")
            .await
            .unwrap();
        assert!(!bundle.mutations.is_empty());
        assert_eq!(orch.provider().call_count(), 3);
        assert_eq!(orch.state().writes(), 0);
    }
}
