//! # TanOS CLI
//!
//! Command-line interface for talking to Nomad through the TanOS modules.
//!
//! Usage:
//!   tanos interact -m <MODULE> -i <TEXT>
//!   tanos log-health [--sleep-quality N] [--hrv N] ...
//!   tanos evolve-prompt -m <MODULE> -f <FILE> -o <OBJECTIVE>
//!
//! Examples:
//!   tanos interact -m ChartRoom -i "Help me plan a new blog post"
//!   tanos log-health --sleep-quality 8 --sleep-hours 7 --mood "Spring expansive"
//!   tanos add-changelog-entry --version 0.3.1 -s "Sharper planning" \
//!       --impacted ChartRoom --files-updated ChartRoom/Planning_Module_Prompt.txt

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tanos_agent::{HealthLog, Orchestrator};
use tanos_core::{AnyProvider, Module, PathSegment, ProviderKind, Settings};
use tracing::debug;

#[derive(Parser)]
#[command(name = "tanos")]
#[command(author, version, about = "TanOS - Nomad, a personal copilot shell")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root of the module prompt templates
    #[arg(long, global = true)]
    prompts_dir: Option<PathBuf>,

    /// Root of memories, operational state and changelog
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// LLM provider: mock, openai or ollama
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "TANOS_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Send input to one TanOS module
    Interact {
        /// CaptainsLog, ChartRoom, Workshop, PhilosophersPorch or CrowsNest
        #[arg(short, long)]
        module: String,

        #[arg(short, long)]
        input: String,
    },
    /// Log health and subjective state for CrowsNest
    LogHealth {
        /// Sleep quality (1-10)
        #[arg(long)]
        sleep_quality: Option<f32>,
        /// Hours slept
        #[arg(long)]
        sleep_hours: Option<f32>,
        /// Morning HRV (ms)
        #[arg(long)]
        hrv: Option<u32>,
        /// Morning resting heart rate
        #[arg(long)]
        rhr: Option<u32>,
        /// AM supplements taken?
        #[arg(long, value_enum, ignore_case = true)]
        am_supps: Option<Taken>,
        /// PM supplements taken?
        #[arg(long, value_enum, ignore_case = true)]
        pm_supps: Option<Taken>,
        /// Diet status
        #[arg(long, value_enum, ignore_case = true)]
        diet_track: Option<DietTrack>,
        /// Tretinoin applied?
        #[arg(long, value_enum, ignore_case = true)]
        tretinoin: Option<YesNo>,
        /// Current mood (e.g. Spring expansive, Neutral, Stressed)
        #[arg(long)]
        mood: Option<String>,
        /// Energy level (1-10)
        #[arg(long)]
        energy: Option<u8>,
        /// Stress level (1-10)
        #[arg(long)]
        stress: Option<u8>,
    },
    /// Start a conceptual tool from Workshop/Tools
    Tool {
        /// Tool prompt filename
        #[arg(short, long)]
        file: String,

        #[arg(short, long)]
        input: String,
    },
    /// Show the Captain's Log operational state
    ViewState,
    /// Show a structured memory document
    ViewMemory {
        key: String,
    },
    /// Show recent Nomad changelog entries
    ViewChangelog {
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Draft the next changelog entry without saving it
    DraftChangelog {
        #[arg(short, long)]
        summary: String,

        /// Comma-separated impacted modules
        #[arg(long, default_value = "")]
        impacted: String,

        /// Comma-separated updated files
        #[arg(long, default_value = "")]
        files: String,
    },
    /// Add a changelog entry after updating prompts or memories
    AddChangelogEntry {
        /// New version string (e.g. 0.3.1)
        #[arg(long)]
        version: String,

        #[arg(short, long)]
        summary: String,

        /// Comma-separated impacted modules (e.g. ChartRoom,Workshop)
        #[arg(long)]
        impacted: String,

        /// Comma-separated files that were updated
        #[arg(long)]
        files_updated: String,
    },
    /// Record a suggested memory change for manual review
    SuggestMemory {
        key: String,

        #[arg(short, long)]
        description: String,

        /// Section path inside the memory, e.g. values/0
        #[arg(long)]
        path: Option<String>,
    },
    /// Run the ArchitectOS G-C-M cycle against a prompt
    EvolvePrompt {
        #[arg(short, long, value_parser = parse_module)]
        module: Module,

        /// Prompt filename within the module
        #[arg(short, long)]
        file: String,

        /// What the evolved prompt should do better
        #[arg(short, long)]
        objective: String,

        /// Print the bundle as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Taken {
    Yes,
    No,
    Partial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DietTrack {
    On,
    Partial,
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum YesNo {
    Yes,
    No,
}

/// Canonical lowercase name of a choice flag.
fn choice<T: ValueEnum>(value: Option<T>) -> Option<String> {
    value
        .and_then(|v| v.to_possible_value())
        .map(|p| p.get_name().to_string())
}

fn parse_module(s: &str) -> std::result::Result<Module, tanos_core::Error> {
    s.parse()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

fn settings_for(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_env().context("Invalid TanOS environment")?;
    if let Some(dir) = &cli.prompts_dir {
        settings = settings.with_prompts_dir(dir);
    }
    if let Some(dir) = &cli.data_dir {
        settings = settings.with_data_dir(dir);
    }
    if let Some(provider) = cli.provider {
        settings = settings.with_provider(provider);
    }
    Ok(settings)
}

async fn run(command: Commands, orch: &mut Orchestrator<AnyProvider>, settings: &Settings) -> Result<()> {
    match command {
        Commands::Interact { module, input } => {
            let response = orch.process_interaction(&input, &module).await;
            println!("--- Nomad ({}) ---", module);
            println!("{}", response);
        }
        Commands::LogHealth {
            sleep_quality,
            sleep_hours,
            hrv,
            rhr,
            am_supps,
            pm_supps,
            diet_track,
            tretinoin,
            mood,
            energy,
            stress,
        } => {
            let log = HealthLog {
                sleep_quality,
                sleep_hours,
                hrv,
                rhr,
                am_supps: choice(am_supps),
                pm_supps: choice(pm_supps),
                diet_track: choice(diet_track),
                tretinoin: choice(tretinoin),
                mood,
                energy,
                stress,
            };
            if log.is_empty() {
                println!("No health data provided to log.");
                return Ok(());
            }
            println!("Logging health metrics: '{}'", log.render());
            let response = orch.log_health(&log).await?;
            println!("\n--- Nomad (CrowsNest) ---");
            println!("{}", response);
            println!("\nCaptain's Log updated with these health metrics.");
        }
        Commands::Tool { file, input } => {
            let response = orch.run_conceptual_tool(&file, &input).await;
            println!("--- Nomad (Workshop: {}) ---", file);
            println!("{}", response);
        }
        Commands::ViewState => {
            println!("--- Current Captain's Log State ---");
            println!("{}", orch.state_mut().get_formatted());
        }
        Commands::ViewMemory { key } => {
            println!("--- Content of MEMORY: {} ---", key);
            println!("{}", orch.memories_mut().get_full_text(&key));
        }
        Commands::ViewChangelog { limit } => {
            println!("--- Nomad Changelog (Last {} Entries) ---", limit);
            let entries = orch.changelog().entries(limit);
            if entries.is_empty() {
                println!("Changelog is empty.");
            }
            for entry in entries {
                println!("Version: {} (Date: {})", entry.version, entry.date);
                println!("  Summary: {}", entry.summary);
                println!("  Impacted: {}", entry.impacted_modules.join(", "));
                println!("  Files Updated: {}", entry.files_updated.join(", "));
                println!("{}", "-".repeat(20));
            }
        }
        Commands::DraftChangelog {
            summary,
            impacted,
            files,
        } => {
            let draft =
                orch.draft_changelog_entry(&summary, &split_list(&impacted), &split_list(&files));
            println!("{}", draft);
        }
        Commands::AddChangelogEntry {
            version,
            summary,
            impacted,
            files_updated,
        } => {
            let entry = orch.commit_changelog_entry(
                &version,
                &summary,
                &split_list(&impacted),
                &split_list(&files_updated),
            );
            println!("Entry for version {} added to Nomad changelog.", entry.version);
            println!("Captain's Log nomad_version updated to {}.", orch.state().version());
        }
        Commands::SuggestMemory {
            key,
            description,
            path,
        } => {
            let section = path.as_deref().map(PathSegment::parse_path);
            let suggestion =
                orch.memories_mut()
                    .suggest_update(&key, &description, section.as_deref());
            println!(
                "Suggestion recorded for {} ({}). Apply it by hand after review.",
                suggestion.memory_key, suggestion.target_file
            );
        }
        Commands::EvolvePrompt {
            module,
            file,
            objective,
            json,
        } => {
            let bundle = match orch.evolve_prompt(&objective, module.as_str(), &file).await {
                Ok(bundle) => bundle,
                Err(marker) => {
                    println!("{}", marker);
                    println!("No evolved suggestions generated.");
                    return Ok(());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
                return Ok(());
            }
            println!("--- ArchitectOS G-C-M Cycle Output ---");
            println!("Suggested Evolved Prompt Text/Concepts:\n{}", bundle.mutations);
            println!("\nGenerator Proposals:\n{}", bundle.proposals);
            println!("\nCritic Notes:\n{}", bundle.critique);
            println!("\nSuggested Next Architect Cycle: {}", bundle.next_steps);
            println!(
                "\nACTION: if a suggestion is valuable, update '{}' by hand,\n\
                 then record it with 'tanos add-changelog-entry'.",
                settings.prompts_dir.join(module.as_str()).join(&file).display()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let settings = settings_for(&cli)?;
    debug!(
        prompts_dir = %settings.prompts_dir.display(),
        data_dir = %settings.data_dir.display(),
        provider = settings.provider.as_str(),
        "settings loaded"
    );
    let provider = AnyProvider::from_settings(&settings).context("Failed to create LLM provider")?;
    let mut orch = Orchestrator::from_settings(&settings, provider)
        .context("Failed to initialize TanOS")?;

    run(cli.command, &mut orch, &settings).await
}
