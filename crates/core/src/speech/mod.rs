//! Speech pipeline: a cloneable dispatcher handle feeding one actor task that
//! resolves text (AI or script), posts it to the bubble, synthesizes it and
//! plays it.

mod brain;
mod dispatcher;
mod display;
mod playback;
mod request;
mod scratch;
mod synth;
mod worker;

pub use brain::{AiBackend, AiError, build_messages, rephrase_prompt};
pub use dispatcher::{DispatchError, SpeechCommand, SpeechDispatcher, SpeechQueue};
pub use display::{DisplayState, DisplayUpdate};
pub use playback::{AudioSink, CommandPlayer, PlaybackError};
pub use request::{AiContext, RequestKind, SpeechRequest, long_enough};
pub use scratch::{ScratchDir, remove_clip};
pub use synth::{
    CommandSynthesizer, RetryPolicy, SpeechError, SpeechSynthesizer, VoiceParams, classify_failure,
    synthesize_with_retry,
};
pub use worker::{DisplayTimings, SpeechWorker, SpeechWorkerConfig};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PetConfig;
use crate::personality::PersonalityScript;

/// Running speech pipeline as seen by the frame loop.
pub struct SpeechHandles {
    pub dispatcher: SpeechDispatcher,
    pub display_rx: mpsc::Receiver<DisplayUpdate>,
    pub task: JoinHandle<()>,
}

/// Wire the dispatcher, the actor and the bubble channel together.
pub fn spawn_speech(
    cfg: &PetConfig,
    script: PersonalityScript,
    ai: Option<AiBackend>,
    synth: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    token: CancellationToken,
) -> SpeechHandles {
    let tuning = &cfg.tuning;
    let (dispatcher, rx) = SpeechDispatcher::channel(script, tuning.speech_queue_cap, tuning.min_speech_chars);
    let (display_tx, display_rx) = mpsc::channel(tuning.display_channel_cap.max(1));
    let worker = SpeechWorker::new(
        rx,
        dispatcher.pending_counter(),
        ai,
        synth,
        sink,
        display_tx,
        SpeechWorkerConfig::new(&cfg.speech, tuning),
    );
    let task = worker.spawn(token);
    SpeechHandles { dispatcher, display_rx, task }
}
