use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("player could not start: {0}")]
    Spawn(String),
    #[error("player exited with {0}")]
    Failed(String),
}

/// Plays one clip to completion. Dropping the future stops playback.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, clip: &Path) -> Result<(), PlaybackError>;
}

/// Plays clips through an external player (ffplay by default).
pub struct CommandPlayer {
    command: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl AudioSink for CommandPlayer {
    async fn play(&self, clip: &Path) -> Result<(), PlaybackError> {
        let (program, leading) = self
            .command
            .split_first()
            .ok_or_else(|| PlaybackError::Spawn("no player command configured".into()))?;

        // kill_on_drop: an aborted task takes the player process with it
        let mut child = tokio::process::Command::new(program)
            .args(leading)
            .arg(clip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Spawn(format!("{program}: {e}")))?;

        let status = child.wait().await.map_err(|e| PlaybackError::Failed(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(PlaybackError::Failed(status.to_string()))
        }
    }
}
