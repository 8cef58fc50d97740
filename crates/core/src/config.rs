use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Pet opened when the config names none.
pub const DEFAULT_PET: &str = "assets/pets/Clippy/clippy2025_1.0.gif";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// Which AI backend answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiBackendKind {
    #[default]
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    pub backend: AiBackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Bounded wait for one backend reply.
    pub timeout_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: AiBackendKind::Local,
            model: None,
            base_url: None,
            timeout_ms: 8000,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Voice and external program settings for the speech pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechCfg {
    pub voice: String,
    pub rate: String,
    pub volume: String,
    /// Synthesizer program and leading arguments.
    pub synth_command: Vec<String>,
    /// Player program and leading arguments; the clip path is appended.
    pub player_command: Vec<String>,
    /// Scratch directory for synthesized clips. Purged at startup and exit.
    pub scratch_dir: PathBuf,
}

impl Default for SpeechCfg {
    fn default() -> Self {
        Self {
            voice: "en-US-GuyNeural".into(),
            rate: "-20%".into(),
            volume: "+0%".into(),
            synth_command: vec!["edge-tts".into()],
            player_command: vec![
                "ffplay".into(),
                "-nodisp".into(),
                "-autoexit".into(),
                "-loglevel".into(),
                "quiet".into(),
            ],
            scratch_dir: std::env::temp_dir().join("deskpet-voices"),
        }
    }
}

/// Loop and pipeline tunables. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // frame loop
    pub tick_ms: u64,
    pub animation_divisor: u32,

    // movement (cells per tick)
    pub speed_x: f32,
    pub speed_y: f32,

    // idle chatter
    pub idle_roll_sides: u32,
    pub idle_cooldown_secs: u64,

    // speech bubble
    pub ai_reply_display_secs: u64,
    pub reaction_display_secs: u64,

    // speech pipeline
    pub synth_max_attempts: u32,
    pub synth_retry_delay_ms: u64,
    pub speech_queue_cap: usize,
    pub display_channel_cap: usize,
    pub min_speech_chars: usize,

    // assets
    pub pets_root: PathBuf,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tick_ms: 33,
            animation_divisor: 2,
            speed_x: 0.5,
            speed_y: 0.25,
            idle_roll_sides: 101,
            idle_cooldown_secs: 10,
            ai_reply_display_secs: 7,
            reaction_display_secs: 5,
            synth_max_attempts: 3,
            synth_retry_delay_ms: 2000,
            speech_queue_cap: 8,
            display_channel_cap: 32,
            min_speech_chars: 3,
            pets_root: PathBuf::from("assets/pets"),
        }
    }
}

impl Tuning {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// User configuration persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetConfig {
    pub current_theme: Theme,
    pub last_pet: PathBuf,
    pub ai_config: AiConfig,
    pub speech: SpeechCfg,
    pub tuning: Tuning,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            current_theme: Theme::Dark,
            last_pet: PathBuf::from(DEFAULT_PET),
            ai_config: AiConfig::default(),
            speech: SpeechCfg::default(),
            tuning: Tuning::default(),
        }
    }
}

impl PetConfig {
    /// Strict load; missing file and bad JSON are both errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load, falling back to defaults on any fault. Never fails.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "config unreadable, using defaults");
                Self::default()
            }
        }
    }

    /// Write the config with 4-space indentation. The file is replaced via a
    /// sibling temp file so a crash mid-write leaves the old config intact.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io { path: path.display().to_string(), source };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser).map_err(|source| ConfigError::Malformed {
            path: path.display().to_string(),
            source,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &buf).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    /// Flip the theme and persist.
    pub fn toggle_theme(&mut self, path: &Path) -> Result<Theme, ConfigError> {
        self.current_theme = self.current_theme.toggled();
        self.save(path)?;
        Ok(self.current_theme)
    }

    /// Record the selected pet and persist.
    pub fn select_pet(&mut self, pet: PathBuf, path: &Path) -> Result<(), ConfigError> {
        self.last_pet = pet;
        self.save(path)
    }
}

/// Config path from `DESKPET_CONFIG`, else [`DEFAULT_CONFIG_PATH`].
pub fn config_path_from_env() -> PathBuf {
    std::env::var_os("DESKPET_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
