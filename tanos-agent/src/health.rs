//! Structured health check-in for the CrowsNest module.

use serde::{Deserialize, Serialize};

/// HRV below this (ms) raises a yellow flag.
pub const HRV_YELLOW_BELOW: u32 = 45;
/// Sleep quality below this (1-10) raises a yellow flag.
pub const SLEEP_QUALITY_YELLOW_BELOW: f32 = 6.0;

const NO_FLAGS: &str = "No flags active";

/// One morning/evening check-in. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthLog {
    pub sleep_quality: Option<f32>,
    pub sleep_hours: Option<f32>,
    pub hrv: Option<u32>,
    pub rhr: Option<u32>,
    pub am_supps: Option<String>,
    pub pm_supps: Option<String>,
    pub diet_track: Option<String>,
    pub tretinoin: Option<String>,
    pub mood: Option<String>,
    pub energy: Option<u8>,
    pub stress: Option<u8>,
}

fn title_case(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl HealthLog {
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        fn text<T: ToString>(value: &Option<T>) -> Option<String> {
            value.as_ref().map(|v| v.to_string())
        }
        vec![
            ("sleep_quality", text(&self.sleep_quality)),
            ("sleep_hours", text(&self.sleep_hours)),
            ("hrv", text(&self.hrv)),
            ("rhr", text(&self.rhr)),
            ("am_supps", text(&self.am_supps)),
            ("pm_supps", text(&self.pm_supps)),
            ("diet_track", text(&self.diet_track)),
            ("tretinoin", text(&self.tretinoin)),
            ("mood", text(&self.mood)),
            ("energy", text(&self.energy)),
            ("stress", text(&self.stress)),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    /// `"Sleep Quality: 8; Hrv: 52"`, in field order, set fields only.
    pub fn render(&self) -> String {
        self.fields()
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| format!("{}: {}", title_case(name), v)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Mood/energy line for the operational state, if either was given.
    pub fn mood_energy_summary(&self) -> Option<String> {
        match (&self.mood, self.energy) {
            (Some(mood), Some(energy)) => Some(format!("{}, Energy {}/10", mood, energy)),
            (Some(mood), None) => Some(mood.clone()),
            (None, Some(energy)) => Some(format!("Energy {}/10", energy)),
            (None, None) => None,
        }
    }

    /// Health flags from this single reading.
    pub fn flags(&self) -> String {
        let mut flags = Vec::new();
        if self.hrv.is_some_and(|hrv| hrv < HRV_YELLOW_BELOW) {
            flags.push("HRV Yellow");
        }
        if self
            .sleep_quality
            .is_some_and(|q| q < SLEEP_QUALITY_YELLOW_BELOW)
        {
            flags.push("Sleep Yellow");
        }
        if flags.is_empty() {
            NO_FLAGS.to_string()
        } else {
            flags.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let log = HealthLog {
            sleep_quality: Some(8.0),
            hrv: Some(52),
            am_supps: Some("yes".into()),
            ..Default::default()
        };
        assert_eq!(log.render(), "Sleep Quality: 8; Hrv: 52; Am Supps: yes");
        assert!(!log.is_empty());
    }

    #[test]
    fn test_empty() {
        let log = HealthLog::default();
        assert!(log.is_empty());
        assert_eq!(log.render(), "");
        assert_eq!(log.mood_energy_summary(), None);
    }

    #[test]
    fn test_flags() {
        let ok = HealthLog {
            hrv: Some(52),
            sleep_quality: Some(7.5),
            ..Default::default()
        };
        assert_eq!(ok.flags(), "No flags active");

        let low = HealthLog {
            hrv: Some(40),
            sleep_quality: Some(5.0),
            ..Default::default()
        };
        assert_eq!(low.flags(), "HRV Yellow, Sleep Yellow");

        let boundary = HealthLog {
            hrv: Some(45),
            sleep_quality: Some(6.0),
            ..Default::default()
        };
        assert_eq!(boundary.flags(), "No flags active");
    }

    #[test]
    fn test_mood_energy_summary() {
        let log = HealthLog {
            mood: Some("Spring expansive".into()),
            energy: Some(6),
            ..Default::default()
        };
        assert_eq!(
            log.mood_energy_summary().as_deref(),
            Some("Spring expansive, Energy 6/10")
        );

        let energy_only = HealthLog {
            energy: Some(3),
            ..Default::default()
        };
        assert_eq!(energy_only.mood_energy_summary().as_deref(), Some("Energy 3/10"));
    }
}
