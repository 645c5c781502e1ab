//! # TanOS Agent
//!
//! Drives the stores in `tanos-core` through the LLM:
//! 1. The user picks a module and sends input
//! 2. The orchestrator loads that module's prompt
//! 3. Operational state and core memories are compiled into one context
//! 4. The provider answers; the operational state is saved once
//!
//! ArchitectOS runs separately: a Generate -> Critique -> Mutate chain that
//! proposes edits to a prompt for the user to review.

mod architect;
mod health;
mod orchestrator;

pub use architect::{EvolutionBundle, EvolutionCycle, Stage, NEXT_STEPS};
pub use health::{HealthLog, HRV_YELLOW_BELOW, SLEEP_QUALITY_YELLOW_BELOW};
pub use orchestrator::{error_marker, Orchestrator};
