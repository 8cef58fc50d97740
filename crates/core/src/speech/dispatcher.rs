use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use rand::Rng;
use tokio::sync::mpsc;

use super::request::{AiContext, RequestKind, SpeechRequest, long_enough};
use crate::mood::Mood;
use crate::personality::PersonalityScript;
use crate::telemetry::TelemetrySnapshot;

/// Work sent to the speech actor.
#[derive(Debug)]
pub enum SpeechCommand {
    Speak(SpeechRequest),
    /// Short sound effect, played over nothing; cut off by the next speech.
    Effect(PathBuf),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("text too short to speak")]
    TooShort,
    #[error("speech queue full")]
    QueueFull,
    #[error("speech actor stopped")]
    Closed,
}

/// Receiving end of the two speech lanes. User questions travel on their own
/// lane and are served before ambient chatter, so reactions piling up can
/// never crowd a question out.
#[derive(Debug)]
pub struct SpeechQueue {
    prompts: mpsc::Receiver<SpeechCommand>,
    ambient: mpsc::Receiver<SpeechCommand>,
}

impl SpeechQueue {
    /// Next command, questions first. `None` once every handle is gone.
    pub async fn recv(&mut self) -> Option<SpeechCommand> {
        tokio::select! {
            biased;
            Some(cmd) = self.prompts.recv() => Some(cmd),
            cmd = self.ambient.recv() => cmd,
        }
    }

    pub fn try_recv(&mut self) -> Result<SpeechCommand, mpsc::error::TryRecvError> {
        self.prompts.try_recv().or_else(|_| self.ambient.try_recv())
    }
}

/// Cheap, cloneable handle for queueing speech. Never blocks the caller.
#[derive(Debug, Clone)]
pub struct SpeechDispatcher {
    prompt_tx: mpsc::Sender<SpeechCommand>,
    tx: mpsc::Sender<SpeechCommand>,
    pending: Arc<AtomicUsize>,
    next_seq: Arc<AtomicU64>,
    script: Arc<PersonalityScript>,
    min_chars: usize,
}

impl SpeechDispatcher {
    /// Handle plus the receiving end the speech actor consumes. Each lane
    /// holds up to `capacity` commands.
    pub fn channel(script: PersonalityScript, capacity: usize, min_chars: usize) -> (Self, SpeechQueue) {
        let (prompt_tx, prompts) = mpsc::channel(capacity.max(1));
        let (tx, ambient) = mpsc::channel(capacity.max(1));
        let handle = Self {
            prompt_tx,
            tx,
            pending: Arc::new(AtomicUsize::new(0)),
            next_seq: Arc::new(AtomicU64::new(0)),
            script: Arc::new(script),
            min_chars,
        };
        (handle, SpeechQueue { prompts, ambient })
    }

    /// Same queue and counters, different pet.
    pub fn with_script(&self, script: PersonalityScript) -> Self {
        Self { script: Arc::new(script), ..self.clone() }
    }

    pub fn script(&self) -> &PersonalityScript {
        &self.script
    }

    /// Shared counter of queued or in-flight speech requests. The actor
    /// decrements it when a request finishes.
    pub fn pending_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pending)
    }

    /// True while any speech request is queued or being spoken.
    pub fn is_busy(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Queue a request. Returns its sequence number.
    pub fn dispatch(&self, mut request: SpeechRequest) -> Result<u64, DispatchError> {
        if !request.is_ai_query && !long_enough(&request.text_or_prompt, self.min_chars) {
            tracing::debug!(text = %request.text_or_prompt, "scripted line too short, not queued");
            return Err(DispatchError::TooShort);
        }
        request.seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let seq = request.seq;
        let lane = if request.kind == RequestKind::UserPrompt { &self.prompt_tx } else { &self.tx };

        // count before sending so the actor can never decrement first
        self.pending.fetch_add(1, Ordering::SeqCst);
        match lane.try_send(SpeechCommand::Speak(request)) {
            Ok(()) => {
                tracing::debug!(seq, "speech queued");
                Ok(seq)
            }
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                match e {
                    mpsc::error::TrySendError::Full(_) => {
                        tracing::warn!(seq, "speech queue full, request dropped");
                        Err(DispatchError::QueueFull)
                    }
                    mpsc::error::TrySendError::Closed(_) => Err(DispatchError::Closed),
                }
            }
        }
    }

    /// Speak the scripted reaction for `mood`, if the pet has one.
    pub fn say_for_mood(&self, mood: &Mood, stats: Option<TelemetrySnapshot>) -> Option<u64> {
        let Some(line) = self.script.reaction_for(mood) else {
            tracing::debug!(mood = %mood, pet = %self.script.name, "no scripted reaction");
            return None;
        };
        let request = SpeechRequest::scripted(RequestKind::MoodReaction(mood.clone()), line, self.context(mood, stats));
        self.dispatch(request).ok()
    }

    /// Speak a random idle line, if the pet has any.
    pub fn say_random_idle<R: Rng + ?Sized>(&self, rng: &mut R, mood: &Mood) -> Option<u64> {
        let line = self.script.random_idle(rng)?;
        let request = SpeechRequest::scripted(RequestKind::Idle, line, self.context(mood, None));
        self.dispatch(request).ok()
    }

    /// Ask the AI backend a question. The pet's offline reply is the fallback.
    pub fn ask_ai(&self, prompt: &str, mood: &Mood, stats: Option<TelemetrySnapshot>) -> Result<u64, DispatchError> {
        let request = SpeechRequest::prompt(prompt.trim(), self.script.offline_reply.clone(), self.context(mood, stats));
        self.dispatch(request)
    }

    /// Queue a sound effect. Dropped silently when the queue is full.
    pub fn play_effect(&self, clip: PathBuf) {
        if let Err(e) = self.tx.try_send(SpeechCommand::Effect(clip)) {
            tracing::debug!(error = %e, "sound effect dropped");
        }
    }

    fn context(&self, mood: &Mood, stats: Option<TelemetrySnapshot>) -> AiContext {
        AiContext { mood: mood.clone(), pet_name: self.script.name.clone(), stats }
    }
}
