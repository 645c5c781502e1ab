//! The five interaction modules and the prompt each one speaks through.

use crate::error::{self, Result};
use std::fmt;
use std::str::FromStr;

/// Module whose prompt holds the conceptual tools under `Tools/`.
pub const TOOLS_MODULE: Module = Module::Workshop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    CaptainsLog,
    ChartRoom,
    Workshop,
    PhilosophersPorch,
    CrowsNest,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::CaptainsLog,
        Module::ChartRoom,
        Module::Workshop,
        Module::PhilosophersPorch,
        Module::CrowsNest,
    ];

    /// Directory name under the prompts root.
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::CaptainsLog => "CaptainsLog",
            Module::ChartRoom => "ChartRoom",
            Module::Workshop => "Workshop",
            Module::PhilosophersPorch => "PhilosophersPorch",
            Module::CrowsNest => "CrowsNest",
        }
    }

    /// System prompt filename for the module.
    pub fn prompt_file(&self) -> &'static str {
        match self {
            Module::CaptainsLog => "Nomad_Core_Persona_and_State.txt",
            Module::ChartRoom => "Planning_Module_Prompt.txt",
            Module::Workshop => "Execution_Module_Prompt.txt",
            Module::PhilosophersPorch => "Reflection_Module_Prompt.txt",
            Module::CrowsNest => "Sensory_Input_Module_Prompt.txt",
        }
    }

    /// What the module would do with the response once responses are parsed.
    /// Only logged for now.
    pub fn post_interaction_note(&self) -> &'static str {
        match self {
            Module::CaptainsLog => "response recorded against the current operational state",
            Module::ChartRoom => {
                "would parse plans/tasks, update active projects and hand tasks to Workshop"
            }
            Module::Workshop => {
                "tool use simulated; ChartRoom needs this outcome to pick the next step"
            }
            Module::PhilosophersPorch => {
                "session complete; review insights for manual memory/prompt updates and a changelog commit"
            }
            Module::CrowsNest => {
                "would parse mood and health flags into the operational state and trigger other modules on thresholds"
            }
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = tanos_error::Error;

    /// Case-insensitive match on the module name.
    fn from_str(s: &str) -> Result<Self> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| error::unknown_module(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_prompt_files() {
        assert_eq!(Module::CrowsNest.prompt_file(), "Sensory_Input_Module_Prompt.txt");
        assert_eq!(Module::ChartRoom.prompt_file(), "Planning_Module_Prompt.txt");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("chartroom".parse::<Module>().unwrap(), Module::ChartRoom);
        assert_eq!("PhilosophersPorch".parse::<Module>().unwrap(), Module::PhilosophersPorch);
    }

    #[test]
    fn test_unknown_module() {
        let err = "UnknownModule".parse::<Module>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownModule);
    }

    #[test]
    fn test_round_trip_names() {
        for module in Module::ALL {
            assert_eq!(module.to_string().parse::<Module>().unwrap(), module);
        }
    }
}
