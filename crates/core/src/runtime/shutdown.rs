use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown via CancellationToken.
/// Listens for SIGTERM and Ctrl+C and cancels the token.
#[derive(Debug)]
pub struct ShutdownGuard {
    token: CancellationToken,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// The token every task should watch.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Spawn a task that cancels the token on SIGTERM or Ctrl+C.
    pub fn spawn_signal_listener(&self) {
        let token = self.token.clone();
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to register SIGTERM handler");
                        return;
                    }
                };
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                    _ = signal::ctrl_c() => tracing::info!("received Ctrl+C, shutting down"),
                }
            }
            #[cfg(not(unix))]
            {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = signal::ctrl_c() => tracing::info!("received Ctrl+C, shutting down"),
                }
            }
            token.cancel();
        });
    }

    /// Cancel, then wait up to `timeout` for `task` to finish; abort it after.
    pub async fn drain(&self, name: &str, task: JoinHandle<()>, timeout: Duration) {
        self.token.cancel();
        let abort = task.abort_handle();
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(())) => tracing::debug!(task = name, "task stopped"),
            Ok(Err(e)) => tracing::warn!(task = name, error = %e, "task ended abnormally"),
            Err(_) => {
                tracing::warn!(task = name, ?timeout, "task did not stop in time, aborting");
                abort.abort();
            }
        }
    }
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_cancels_cooperative_task() {
        let guard = ShutdownGuard::new();
        let token = guard.token();
        let task = tokio::spawn(async move { token.cancelled().await });
        guard.drain("test", task, Duration::from_secs(1)).await;
        assert!(guard.token().is_cancelled());
    }

    #[tokio::test]
    async fn drain_aborts_stuck_task() {
        let guard = ShutdownGuard::new();
        let task = tokio::spawn(std::future::pending::<()>());
        let abort = task.abort_handle();
        guard.drain("stuck", task, Duration::from_millis(10)).await;
        for _ in 0..10 {
            if abort.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abort.is_finished());
    }
}
