use std::path::{Path, PathBuf};

/// Directory holding synthesized clips. Cleanup is best-effort: failures are
/// logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Empty out `root` (creating it if needed).
    pub fn prepare(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = Self { root: root.into() };
        dir.purge();
        std::fs::create_dir_all(&dir.root)?;
        Ok(dir)
    }

    /// [`prepare`](Self::prepare), degrading to a directory that may not
    /// exist. Synthesis into it then fails and the pet speaks in text only.
    pub fn prepare_or_warn(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        match Self::prepare(&root) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(dir = %root.display(), error = %e, "scratch directory unavailable, speech will be text only");
                Self { root }
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh, unique clip path inside the directory.
    pub fn clip_path(&self) -> PathBuf {
        self.root.join(format!("voice_{}.mp3", uuid::Uuid::new_v4().simple()))
    }

    /// Delete every file in the directory.
    pub fn purge(&self) {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return;
        };
        let mut removed = 0usize;
        for path in entries.filter_map(Result::ok).map(|e| e.path()).filter(|p| p.is_file()) {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "scratch file not removed"),
            }
        }
        if removed > 0 {
            tracing::info!(dir = %self.root.display(), removed, "scratch directory purged");
        }
    }
}

/// Remove one clip; missing files are fine.
pub async fn remove_clip(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "clip not removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_purges_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("voices");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("voice_old.mp3"), b"x").unwrap();

        let scratch = ScratchDir::prepare(&root).unwrap();
        assert_eq!(std::fs::read_dir(scratch.root()).unwrap().count(), 0);

        let a = scratch.clip_path();
        let b = scratch.clip_path();
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(root.as_path()));
    }

    #[test]
    fn unusable_root_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let root = blocker.join("voices");

        assert!(ScratchDir::prepare(&root).is_err());
        let scratch = ScratchDir::prepare_or_warn(&root);
        assert_eq!(scratch.root(), root.as_path());
        assert!(!root.exists());
        // purging a missing directory is a no-op
        scratch.purge();
        assert!(blocker.is_file());
    }

    #[tokio::test]
    async fn remove_clip_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("voice_a.mp3");
        std::fs::write(&clip, b"x").unwrap();
        remove_clip(&clip).await;
        assert!(!clip.exists());
        remove_clip(&clip).await;
    }
}
