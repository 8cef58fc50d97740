//! End-to-end tests for the speech actor with mock synthesizer, sink and AI.
//!
//! Dispatcher → queue → actor (AI or fallback) → bubble update → synthesis
//! with retry → playback, one request at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deskpet_core::config::PetConfig;
use deskpet_core::mood::Mood;
use deskpet_core::personality::PersonalityScript;
use deskpet_core::speech::{
    AiBackend, AudioSink, DispatchError, DisplayUpdate, PlaybackError, SpeechDispatcher, SpeechError,
    SpeechHandles, SpeechSynthesizer, VoiceParams, spawn_speech,
};
use deskpet_llm::provider::{MockBehavior, MockProvider};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy)]
enum SynthOutcome {
    Clip,
    NoAudio,
    Offline,
}

struct MockSynth {
    outcome: SynthOutcome,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl MockSynth {
    fn new(outcome: SynthOutcome) -> Arc<Self> {
        Arc::new(Self { outcome, calls: AtomicUsize::new(0), texts: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynth {
    async fn synthesize(&self, text: &str, _voice: &VoiceParams) -> Result<PathBuf, SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_owned());
        match self.outcome {
            SynthOutcome::Clip => Ok(PathBuf::from(format!("speech-{text}.mp3"))),
            SynthOutcome::NoAudio => Err(SpeechError::NoAudioReceived),
            SynthOutcome::Offline => Err(SpeechError::ConnectionFailure("dns lookup failed".into())),
        }
    }
}

/// Records every clip and the highest number of clips playing at once.
struct TrackingSink {
    hold: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    played: Mutex<Vec<PathBuf>>,
}

impl TrackingSink {
    fn new(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            hold,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            played: Mutex::new(Vec::new()),
        })
    }

    fn played(&self) -> Vec<PathBuf> {
        self.played.lock().unwrap().clone()
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioSink for TrackingSink {
    async fn play(&self, clip: &Path) -> Result<(), PlaybackError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        self.played.lock().unwrap().push(clip.to_path_buf());
        tokio::time::sleep(self.hold).await;
        Ok(())
    }
}

fn test_config() -> PetConfig {
    let mut cfg = PetConfig::default();
    cfg.tuning.synth_retry_delay_ms = 1;
    cfg
}

fn clippy() -> PersonalityScript {
    serde_json::from_value(serde_json::json!({
        "name": "Clippy",
        "idle_messages": ["It looks like you're writing a letter."],
        "mood_reactions": {
            "MELTING": "It's getting hot in here!",
            "BORED": "Eh",
            "STUFFED": "I ate too many tabs."
        }
    }))
    .unwrap()
}

fn start(ai: Option<AiBackend>, synth: Arc<MockSynth>, sink: Arc<TrackingSink>) -> (SpeechHandles, CancellationToken) {
    let token = CancellationToken::new();
    let handles = spawn_speech(&test_config(), clippy(), ai, synth, sink, token.clone());
    (handles, token)
}

fn mock_ai(behavior: MockBehavior) -> (AiBackend, MockProvider) {
    let mock = MockProvider::with_behavior(behavior);
    (AiBackend::new(Arc::new(mock.clone()), Duration::from_millis(200)), mock)
}

async fn settle(speech: &SpeechDispatcher) {
    for _ in 0..400 {
        if !speech.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("speech pipeline never went idle");
}

fn drain(handles: &mut SpeechHandles) -> Vec<DisplayUpdate> {
    let mut out = Vec::new();
    while let Ok(u) = handles.display_rx.try_recv() {
        out.push(u);
    }
    out
}

#[tokio::test]
async fn unreachable_ai_falls_back_to_offline_reply() {
    let synth = MockSynth::new(SynthOutcome::Clip);
    let sink = TrackingSink::new(Duration::ZERO);
    let (ai, mock) = mock_ai(MockBehavior::Connection("connection refused".into()));
    let (mut handles, _token) = start(Some(ai), synth.clone(), sink.clone());

    let seq = handles.dispatcher.ask_ai("hello", &Mood::Chilling, None).unwrap();
    settle(&handles.dispatcher).await;

    assert_eq!(mock.calls(), 1);
    let updates = drain(&mut handles);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].seq, seq);
    assert_eq!(updates[0].text, deskpet_core::personality::DEFAULT_OFFLINE_REPLY);
    // fallback text uses the short display time
    assert_eq!(updates[0].duration, Duration::from_secs(5));
    assert_eq!(synth.calls(), 1);
    assert_eq!(sink.played().len(), 1);
}

#[tokio::test]
async fn ai_answer_to_question_shows_longer() {
    let synth = MockSynth::new(SynthOutcome::Clip);
    let sink = TrackingSink::new(Duration::ZERO);
    let (ai, mock) = mock_ai(MockBehavior::Reply("Beep boop, all systems go!".into()));
    let (mut handles, _token) = start(Some(ai), synth.clone(), sink);

    handles.dispatcher.ask_ai("how are you?", &Mood::Chilling, None).unwrap();
    settle(&handles.dispatcher).await;
    let updates = drain(&mut handles);
    assert_eq!(updates[0].text, "Beep boop, all systems go!");
    assert_eq!(updates[0].duration, Duration::from_secs(7));

    // scripted lines are rephrased and use the short display time
    let pet = handles.dispatcher.with_script(clippy());
    pet.say_for_mood(&Mood::Melting, None).unwrap();
    settle(&handles.dispatcher).await;
    let updates = drain(&mut handles);
    assert_eq!(updates[0].duration, Duration::from_secs(5));
    let asked = mock.last_request().unwrap().flattened_prompt();
    assert!(asked.contains("in character: \"It's getting hot in here!\""), "{asked}");
}

#[tokio::test]
async fn hanging_ai_times_out_to_fallback() {
    let synth = MockSynth::new(SynthOutcome::Clip);
    let sink = TrackingSink::new(Duration::ZERO);
    let (ai, _mock) = mock_ai(MockBehavior::Hang);
    let (mut handles, _token) = start(Some(ai), synth, sink);

    handles.dispatcher.say_for_mood(&Mood::Stuffed, None).unwrap();
    settle(&handles.dispatcher).await;
    assert_eq!(drain(&mut handles)[0].text, "I ate too many tabs.");
}

#[tokio::test]
async fn no_audio_is_retried_exactly_three_times() {
    let synth = MockSynth::new(SynthOutcome::NoAudio);
    let sink = TrackingSink::new(Duration::ZERO);
    let (mut handles, _token) = start(None, synth.clone(), sink.clone());

    handles.dispatcher.say_for_mood(&Mood::Melting, None).unwrap();
    settle(&handles.dispatcher).await;

    assert_eq!(synth.calls(), 3);
    assert!(sink.played().is_empty());
    // the text was still shown
    assert_eq!(drain(&mut handles)[0].text, "It's getting hot in here!");
}

#[tokio::test]
async fn offline_voice_service_gives_up_at_once_and_keeps_the_text() {
    let synth = MockSynth::new(SynthOutcome::Offline);
    let sink = TrackingSink::new(Duration::ZERO);
    let (ai, _mock) = mock_ai(MockBehavior::Reply("Beep boop, all systems go!".into()));
    let (mut handles, _token) = start(Some(ai), synth.clone(), sink.clone());

    handles.dispatcher.ask_ai("how are you?", &Mood::Chilling, None).unwrap();
    settle(&handles.dispatcher).await;

    assert_eq!(synth.calls(), 1);
    assert!(sink.played().is_empty());
    let updates = drain(&mut handles);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].text, "Beep boop, all systems go!");
}

#[tokio::test]
async fn short_text_is_never_synthesized() {
    let synth = MockSynth::new(SynthOutcome::Clip);
    let sink = TrackingSink::new(Duration::ZERO);
    let (ai, _mock) = mock_ai(MockBehavior::Reply(" ok ".into()));
    let (mut handles, _token) = start(Some(ai), synth.clone(), sink);

    // rejected at dispatch
    assert_eq!(handles.dispatcher.say_for_mood(&Mood::Bored, None), None);
    // accepted, but the AI's answer is too short to speak
    handles.dispatcher.ask_ai("yes or no?", &Mood::Chilling, None).unwrap();
    settle(&handles.dispatcher).await;

    assert_eq!(synth.calls(), 0);
    assert!(drain(&mut handles).is_empty());
    assert_eq!(
        handles.dispatcher.dispatch(deskpet_core::speech::SpeechRequest::scripted(
            deskpet_core::speech::RequestKind::Idle,
            "  a ",
            Default::default(),
        )),
        Err(DispatchError::TooShort)
    );
}

#[tokio::test]
async fn clips_never_overlap() {
    let synth = MockSynth::new(SynthOutcome::Clip);
    let sink = TrackingSink::new(Duration::from_millis(15));
    let (handles, _token) = start(None, synth.clone(), sink.clone());
    let speech = &handles.dispatcher;

    speech.play_effect(PathBuf::from("melting.mp3"));
    speech.say_for_mood(&Mood::Melting, None).unwrap();
    speech.say_for_mood(&Mood::Stuffed, None).unwrap();
    speech.play_effect(PathBuf::from("stuffed.mp3"));
    speech.ask_ai("tell me a joke", &Mood::Stuffed, None).unwrap();
    settle(speech).await;

    assert_eq!(sink.max_active.load(Ordering::SeqCst), 1);
    // the question was queued last but is answered first
    let speech_clips: Vec<_> = sink
        .played()
        .into_iter()
        .filter(|p| p.to_string_lossy().starts_with("speech-"))
        .collect();
    assert_eq!(
        speech_clips,
        vec![
            PathBuf::from(format!("speech-{}.mp3", deskpet_core::personality::DEFAULT_OFFLINE_REPLY)),
            PathBuf::from("speech-It's getting hot in here!.mp3"),
            PathBuf::from("speech-I ate too many tabs..mp3"),
        ]
    );
}

#[tokio::test]
async fn cancellation_stops_the_actor() {
    let synth = MockSynth::new(SynthOutcome::Clip);
    let sink = TrackingSink::new(Duration::from_secs(30));
    let (handles, token) = start(None, synth, sink);

    handles.dispatcher.say_for_mood(&Mood::Melting, None).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    tokio::time::timeout(Duration::from_secs(2), handles.task).await.unwrap().unwrap();
    // the in-flight request is released
    assert!(!handles.dispatcher.is_busy());
}
