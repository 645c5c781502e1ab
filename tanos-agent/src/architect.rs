//! # ArchitectOS evolution cycle
//!
//! Proposes edits to a TanOS prompt with three chained completion calls:
//! Generate -> Critique -> Mutate. Every stage shares one system prompt
//! (objective, target prompt, the user's preferences) and reads the output
//! of the stages before it. Picking a variant is left to the user; nothing
//! is written back.

use serde::{Deserialize, Serialize};
use tanos_core::{
    LlmProvider, MemoryStore, PromptStore, Result, COGNITIVE_PREFERENCES_KEY, CORE_IDENTITY_KEY,
};
use tracing::{debug, info};

pub const NEXT_STEPS: &str = "Review mutated variants. Select the best for Tan to implement. \
Consider deepening on M1 or broadening to another TanOS component.";

/// One step of the cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Critique,
    Mutate,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Generate, Stage::Critique, Stage::Mutate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Generate => "generate",
            Stage::Critique => "critique",
            Stage::Mutate => "mutate",
        }
    }

    /// User prompt for this stage, given what earlier stages produced.
    pub fn instructions(&self, proposals: &str, critique: &str) -> String {
        match self {
            Stage::Generate => "Now, in G_TanOS Mode (Idea Weaver):\n\
Generate 3-5 divergent and novel proposals for improving or expanding the component described above, \
addressing the specific objective. Use techniques like contradiction, metaphor injection, \
domain transfer (especially from Tan's interests like storytelling, philosophy), and analogy blending.\n\
Focus on Novelty/Authenticity FOR TAN, Utility/Leverage FOR TANOS & TAN'S GOALS, and Simplicity/Flow FOR TAN'S USE.\n\
Output each proposal clearly labeled (G1, G2, etc.)."
                .to_string(),
            Stage::Critique => format!(
                "Now, in C_TanOS Mode (Insight Valuator):\n\
Critically evaluate EACH of the following proposals:\n---\n{}\n---\n\
For each proposal, score it on:\n\
- Novelty & Authenticity (for Tan) (0-10): (Score + Brief Rationale)\n\
- Utility & Leverage (for TanOS & Tan's Goals) (0-10): (Score + Brief Rationale)\n\
- Simplicity & Flow (for Tan's Use) (0-10): (Score + Brief Rationale)\n\
Also, note any failure modes (too narrow, too abstract, unclear constraints, premature resolution).\n\
Output clearly for each proposal.",
                proposals
            ),
            Stage::Mutate => format!(
                "Now, in M_TanOS Mode (Evolution Catalyst):\n\
Based on your critiques and the following selected proposals:\n---\n\
Selected Proposals for Mutation:\n\
Proposals from Generator:\n{}\n\nCritiques from Critic:\n{}\n---\n\
Generate 1-3 new, evolved variants of the TanOS component/prompt.\n\
Use mutation techniques such as:\n\
- Inverting logic.\n\
- Rewriting as a myth, poem, or diagram relevant to Tan.\n\
- Infusing a different discipline or cultural lens (e.g., Spanish wisdom, Zen).\n\
- Applying creative constraints (e.g., Fibonacci structuring, radical simplification).\n\
- Reframing failures from the Critic stage into new strengths.\n\
Output each mutated variant clearly labeled (M1, M2, etc.), showing the NEW proposed prompt text or conceptual tool description.",
                proposals, critique
            ),
        }
    }
}

/// What one cycle hands back for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionBundle {
    pub mutations: String,
    pub proposals: String,
    pub critique: String,
    pub next_steps: String,
}

fn architect_prompt(objective: &str, target: &str, memories: &str) -> String {
    format!(
        "You are an Architect Agent. Your mission is to embody the principles of the MEGAPROMPT Discovery Engine.\n\
We will work together to recursively evolve TanOS, specifically the following component/prompt:\n\
COMPONENT OBJECTIVE: {}\n\
CURRENT COMPONENT PROMPT/CONTENT:\n---\n{}\n---\n\
Relevant Tan's MEMORIES Snippets:\n---\n{}\n---\n\
Your goal is to apply the Generator-Critic-Mutator (G-C-M) loop to this.",
        objective, target, memories
    )
}

/// Borrowed view over the stores one cycle needs.
pub struct EvolutionCycle<'a, P> {
    prompts: &'a mut PromptStore,
    memories: &'a mut MemoryStore,
    provider: &'a P,
}

impl<'a, P: LlmProvider> EvolutionCycle<'a, P> {
    pub fn new(prompts: &'a mut PromptStore, memories: &'a mut MemoryStore, provider: &'a P) -> Self {
        Self {
            prompts,
            memories,
            provider,
        }
    }

    fn architect_memories(&mut self) -> String {
        format!(
            "Cognitive/OS Preferences:\n{}\n\nCore Identity/Values:\n{}",
            self.memories.get_full_text(COGNITIVE_PREFERENCES_KEY),
            self.memories.get_full_text(CORE_IDENTITY_KEY)
        )
    }

    /// Run one G-C-M cycle against `module/filename`.
    ///
    /// A missing target prompt fails before any completion call.
    pub async fn run(
        &mut self,
        objective: &str,
        module: &str,
        filename: &str,
    ) -> Result<EvolutionBundle> {
        info!(module, filename, objective, "starting G-C-M cycle");

        let target = self
            .prompts
            .load(module, filename)
            .map_err(|e| e.with_operation("architect::run"))?;
        let base = architect_prompt(objective, &target, &self.architect_memories());

        let mut proposals = String::new();
        let mut critique = String::new();
        let mut mutations = String::new();

        for stage in Stage::ALL {
            let instructions = stage.instructions(&proposals, &critique);
            let output = self.provider.send_prompt(&base, &instructions, None).await;
            debug!(stage = stage.as_str(), chars = output.len(), "stage complete");

            match stage {
                Stage::Generate => proposals = output,
                Stage::Critique => critique = output,
                Stage::Mutate => mutations = output,
            }
        }

        info!(module, filename, "G-C-M cycle complete, awaiting review");
        Ok(EvolutionBundle {
            mutations,
            proposals,
            critique,
            next_steps: NEXT_STEPS.to_string(),
        })
    }
}
