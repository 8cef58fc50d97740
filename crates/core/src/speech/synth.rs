use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use super::scratch::ScratchDir;
use crate::config::SpeechCfg;

/// Voice settings passed to the synthesizer, e.g. `-20%` / `+0%`.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub voice: String,
    pub rate: String,
    pub volume: String,
}

impl From<&SpeechCfg> for VoiceParams {
    fn from(cfg: &SpeechCfg) -> Self {
        Self {
            voice: cfg.voice.clone(),
            rate: cfg.rate.clone(),
            volume: cfg.volume.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The service answered but produced no audio. Usually transient.
    #[error("no audio received")]
    NoAudioReceived,
    #[error("synthesizer connection failed: {0}")]
    ConnectionFailure(String),
    #[error("synthesizer failed: {0}")]
    Backend(String),
}

impl SpeechError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SpeechError::NoAudioReceived)
    }
}

/// Text to audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<PathBuf, SpeechError>;
}

/// How often and how patiently to retry synthesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }
}

/// Synthesize, retrying only `NoAudioReceived` up to the policy's limit.
pub async fn synthesize_with_retry(
    synth: &dyn SpeechSynthesizer,
    text: &str,
    voice: &VoiceParams,
    policy: RetryPolicy,
) -> Result<PathBuf, SpeechError> {
    let mut attempt = 1;
    loop {
        match synth.synthesize(text, voice).await {
            Ok(path) => return Ok(path),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                tracing::warn!(attempt, max = policy.max_attempts, error = %e, "synthesis failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "synthesis abandoned");
                return Err(e);
            }
        }
    }
}

/// Runs an edge-tts compatible command line:
/// `<program> --voice V --rate=R --volume=V --text T --write-media OUT`.
pub struct CommandSynthesizer {
    command: Vec<String>,
    scratch: ScratchDir,
}

impl CommandSynthesizer {
    pub fn new(command: Vec<String>, scratch: ScratchDir) -> Self {
        Self { command, scratch }
    }

    fn build_args(voice: &VoiceParams, text: &str, out: &std::path::Path) -> Vec<String> {
        vec![
            "--voice".into(),
            voice.voice.clone(),
            format!("--rate={}", voice.rate),
            format!("--volume={}", voice.volume),
            "--text".into(),
            text.to_owned(),
            "--write-media".into(),
            out.display().to_string(),
        ]
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<PathBuf, SpeechError> {
        let (program, leading) = self
            .command
            .split_first()
            .ok_or_else(|| SpeechError::Backend("no synthesizer command configured".into()))?;
        let out = self.scratch.clip_path();

        let output = tokio::process::Command::new(program)
            .args(leading)
            .args(Self::build_args(voice, text, &out))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SpeechError::Backend(format!("{program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr));
        }
        match tokio::fs::metadata(&out).await {
            Ok(meta) if meta.len() > 0 => Ok(out),
            _ => Err(SpeechError::NoAudioReceived),
        }
    }
}

/// Map synthesizer stderr to an error kind.
pub fn classify_failure(stderr: &str) -> SpeechError {
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("noaudioreceived") || lower.contains("no audio") {
        SpeechError::NoAudioReceived
    } else if ["connect", "network", "timed out", "name resolution"].iter().any(|k| lower.contains(k)) {
        SpeechError::ConnectionFailure(last_line(stderr))
    } else {
        SpeechError::Backend(last_line(stderr))
    }
}

fn last_line(s: &str) -> String {
    s.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim().to_owned()
}
