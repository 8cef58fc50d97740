use std::fmt;

use crate::telemetry::TelemetrySnapshot;

/// Discrete mood label driving tint, sound effect and spoken reaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Mood {
    Melting,
    Stuffed,
    GamingHard,
    Bored,
    #[default]
    Chilling,
    Panicked,
    /// Extension mood named in a pet's personality script.
    Other(String),
}

impl Mood {
    /// Wire name used in personality scripts.
    pub fn name(&self) -> &str {
        match self {
            Mood::Melting => "MELTING",
            Mood::Stuffed => "STUFFED",
            Mood::GamingHard => "GAMING_HARD",
            Mood::Bored => "BORED",
            Mood::Chilling => "CHILLING",
            Mood::Panicked => "PANICKED",
            Mood::Other(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "MELTING" => Mood::Melting,
            "STUFFED" => Mood::Stuffed,
            "GAMING_HARD" => Mood::GamingHard,
            "BORED" => Mood::Bored,
            "CHILLING" => Mood::Chilling,
            "PANICKED" => Mood::Panicked,
            other => Mood::Other(other.to_owned()),
        }
    }

    /// Severity for simultaneous triggers; higher wins.
    pub fn severity(&self) -> u8 {
        match self {
            Mood::Melting => 6,
            Mood::Panicked => 5,
            Mood::Stuffed => 4,
            Mood::GamingHard => 3,
            Mood::Bored => 2,
            Mood::Chilling => 1,
            Mood::Other(_) => 0,
        }
    }

    /// Sprite tint as RGB.
    pub fn tint(&self) -> (u8, u8, u8) {
        match self {
            Mood::Melting => (255, 50, 50),
            Mood::GamingHard => (200, 0, 255),
            Mood::Panicked => (255, 140, 0),
            Mood::Stuffed => (100, 255, 100),
            Mood::Bored => (150, 150, 255),
            Mood::Chilling | Mood::Other(_) => (255, 255, 255),
        }
    }

    /// File stem of the mood's sound effect inside a pet's `sounds/` folder.
    pub fn sound_stem(&self) -> String {
        self.name().to_ascii_lowercase().replace('_', "-")
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Classifier ──

pub const MELTING_TEMP_C: f32 = 85.0;
pub const STUFFED_MEM_PCT: f32 = 90.0;
pub const GAMING_GPU_PCT: f32 = 90.0;
pub const BORED_CPU_PCT: f32 = 5.0;

/// One row of the priority table.
pub struct MoodRule {
    pub mood: Mood,
    pub when: fn(&TelemetrySnapshot) -> bool,
}

/// Evaluated top to bottom; first match wins. Falls through to `Chilling`.
pub fn rules() -> [MoodRule; 4] {
    [
        MoodRule { mood: Mood::Melting, when: |s| s.max_temp() > MELTING_TEMP_C },
        MoodRule { mood: Mood::Stuffed, when: |s| s.mem_usage > STUFFED_MEM_PCT },
        MoodRule { mood: Mood::GamingHard, when: |s| s.gpu_usage > GAMING_GPU_PCT },
        MoodRule { mood: Mood::Bored, when: |s| s.cpu_usage < BORED_CPU_PCT },
    ]
}

/// Map a snapshot to exactly one mood. Pure and total.
pub fn classify(snapshot: &TelemetrySnapshot) -> Mood {
    rules()
        .into_iter()
        .find(|rule| (rule.when)(snapshot))
        .map(|rule| rule.mood)
        .unwrap_or(Mood::Chilling)
}
