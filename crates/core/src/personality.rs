use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::mood::Mood;

pub const DEFAULT_OFFLINE_REPLY: &str = "My circuits are buzzing! I can't talk right now.";

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("personality file missing: {0}")]
    Missing(String),
    #[error("personality io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed personality at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Static lines a pet speaks. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityScript {
    pub name: String,
    #[serde(default)]
    pub idle_messages: Vec<String>,
    /// Keyed by mood wire name (`"MELTING"`, or any extension mood).
    #[serde(default)]
    pub mood_reactions: HashMap<String, String>,
    /// Spoken when a user question cannot reach the AI backend.
    #[serde(default = "default_offline_reply")]
    pub offline_reply: String,
}

fn default_offline_reply() -> String {
    DEFAULT_OFFLINE_REPLY.to_owned()
}

impl Default for PersonalityScript {
    fn default() -> Self {
        Self {
            name: "Unknown".into(),
            idle_messages: Vec::new(),
            mood_reactions: HashMap::new(),
            offline_reply: default_offline_reply(),
        }
    }
}

impl PersonalityScript {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Err(ScriptError::Missing(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ScriptError::Malformed {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load, substituting an empty script on any fault.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(script) => {
                tracing::info!(
                    name = %script.name,
                    idle = script.idle_messages.len(),
                    reactions = script.mood_reactions.len(),
                    "personality loaded"
                );
                script
            }
            Err(e) => {
                tracing::warn!(error = %e, "personality unavailable, pet will stay quiet");
                Self::default()
            }
        }
    }

    /// Scripted reaction for a mood, if one exists.
    pub fn reaction_for(&self, mood: &Mood) -> Option<&str> {
        self.mood_reactions.get(mood.name()).map(String::as_str)
    }

    /// Random idle line; `None` when the script has none.
    pub fn random_idle<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.idle_messages.choose(rng).map(String::as_str)
    }

    /// Moods the script reacts to that the classifier does not produce.
    pub fn extension_moods(&self) -> Vec<Mood> {
        let mut moods: Vec<Mood> = self
            .mood_reactions
            .keys()
            .map(|k| Mood::parse(k))
            .filter(|m| matches!(m, Mood::Other(_)))
            .collect();
        moods.sort_by(|a, b| a.name().cmp(b.name()));
        moods
    }
}
