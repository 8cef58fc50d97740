use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::brain::{AiBackend, rephrase_prompt};
use super::display::DisplayUpdate;
use super::dispatcher::{SpeechCommand, SpeechQueue};
use super::playback::AudioSink;
use super::request::{SpeechRequest, long_enough};
use super::scratch::remove_clip;
use super::synth::{RetryPolicy, SpeechSynthesizer, VoiceParams, synthesize_with_retry};
use crate::config::{SpeechCfg, Tuning};

/// Bubble durations for the two kinds of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTimings {
    /// AI answer to an explicit user question.
    pub ai_reply: Duration,
    /// Scripted lines, rephrased lines and fallbacks.
    pub reaction: Duration,
}

impl From<&Tuning> for DisplayTimings {
    fn from(t: &Tuning) -> Self {
        Self {
            ai_reply: Duration::from_secs(t.ai_reply_display_secs),
            reaction: Duration::from_secs(t.reaction_display_secs),
        }
    }
}

/// Everything the actor needs besides its queue.
pub struct SpeechWorkerConfig {
    pub voice: VoiceParams,
    pub retry: RetryPolicy,
    pub timings: DisplayTimings,
    pub min_chars: usize,
}

impl SpeechWorkerConfig {
    pub fn new(speech: &SpeechCfg, tuning: &Tuning) -> Self {
        Self {
            voice: VoiceParams::from(speech),
            retry: RetryPolicy::new(tuning.synth_max_attempts, Duration::from_millis(tuning.synth_retry_delay_ms)),
            timings: DisplayTimings::from(tuning),
            min_chars: tuning.min_speech_chars,
        }
    }
}

/// Decrements the pending counter when a request is done, however it ends.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The single consumer of the speech queue. Requests are handled strictly
/// one at a time, so speech clips never overlap.
pub struct SpeechWorker {
    rx: SpeechQueue,
    ai: Option<AiBackend>,
    synth: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    display_tx: mpsc::Sender<DisplayUpdate>,
    pending: Arc<AtomicUsize>,
    cfg: SpeechWorkerConfig,
    effect: Option<JoinHandle<()>>,
}

impl SpeechWorker {
    pub fn new(
        rx: SpeechQueue,
        pending: Arc<AtomicUsize>,
        ai: Option<AiBackend>,
        synth: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
        display_tx: mpsc::Sender<DisplayUpdate>,
        cfg: SpeechWorkerConfig,
    ) -> Self {
        Self { rx, ai, synth, sink, display_tx, pending, cfg, effect: None }
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }

    /// Consume commands until the queue closes or `token` is cancelled.
    pub async fn run(mut self, token: CancellationToken) {
        tracing::info!(ai = self.ai.as_ref().map(AiBackend::name), "speech actor started");
        loop {
            let cmd = tokio::select! {
                _ = token.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
            };
            match cmd {
                SpeechCommand::Speak(request) => {
                    let _done = PendingGuard(Arc::clone(&self.pending));
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = self.speak(request) => {}
                    }
                }
                SpeechCommand::Effect(clip) => self.start_effect(clip).await,
            }
        }
        self.stop_effect().await;
        tracing::info!("speech actor stopped");
    }

    async fn speak(&mut self, request: SpeechRequest) {
        let seq = request.seq;
        let (text, from_ai) = self.resolve(&request).await;

        if !long_enough(&text, self.cfg.min_chars) {
            tracing::debug!(seq, text = %text, "resolved text too short, skipped");
            return;
        }

        let duration = if request.is_ai_query && from_ai {
            self.cfg.timings.ai_reply
        } else {
            self.cfg.timings.reaction
        };
        let update = DisplayUpdate { seq, text: text.clone(), duration };
        if let Err(e) = self.display_tx.try_send(update) {
            tracing::warn!(seq, error = %e, "bubble update dropped");
        }

        let clip = match synthesize_with_retry(self.synth.as_ref(), &text, &self.cfg.voice, self.cfg.retry).await {
            Ok(clip) => clip,
            Err(e) => {
                tracing::warn!(seq, error = %e, "speech not synthesized, shown as text only");
                return;
            }
        };

        // speech pre-empts any effect still playing
        self.stop_effect().await;
        tracing::info!(seq, kind = ?request.kind, "speaking");
        if let Err(e) = self.sink.play(&clip).await {
            tracing::warn!(seq, error = %e, "speech playback failed");
        }
        remove_clip(&clip).await;
    }

    /// AI text when a backend answers, else the request's fallback.
    async fn resolve(&self, request: &SpeechRequest) -> (String, bool) {
        let Some(ai) = &self.ai else {
            return (request.fallback_text.clone(), false);
        };
        let prompt = if request.is_ai_query {
            request.text_or_prompt.clone()
        } else {
            rephrase_prompt(&request.text_or_prompt)
        };
        match ai.ask(&prompt, &request.context).await {
            Ok(reply) => (reply, true),
            Err(e) => {
                tracing::warn!(seq = request.seq, kind = e.kind(), error = %e, "ai backend failed, using fallback");
                (request.fallback_text.clone(), false)
            }
        }
    }

    async fn start_effect(&mut self, clip: PathBuf) {
        self.stop_effect().await;
        let sink = Arc::clone(&self.sink);
        self.effect = Some(tokio::spawn(async move {
            if let Err(e) = sink.play(&clip).await {
                tracing::debug!(clip = %clip.display(), error = %e, "sound effect failed");
            }
        }));
    }

    async fn stop_effect(&mut self) {
        if let Some(handle) = self.effect.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}
